//! Trace Log Stitcher
//!
//! Per-call event attribution for EVM transactions: attaches each receipt
//! log to the call that emitted it, using the opcode-level step trace to
//! recover which frame ran each LOG opcode and which frames reverted.
//!
//! The pipeline:
//! - [`parser`] reads the step trace, callTracer tree and receipt
//! - [`stitcher`] derives event paths and attaches logs to call nodes
//! - [`enricher`] resolves method names and decodes events
//! - [`output`] writes the annotated tree as a JSON report
//!
//! The `log-stitch` binary wraps this in a CLI:
//!
//! ```bash
//! log-stitch stitch --trace trace.json --calls calls.json --receipt receipt.json
//! ```

pub mod commands;
pub mod enricher;
pub mod output;
pub mod parser;
pub mod stitcher;
pub mod utils;
