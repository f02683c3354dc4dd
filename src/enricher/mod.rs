//! Method-name and event decoding for stitched call trees.
//!
//! This module handles:
//! - Resolving call selectors to method names
//! - Resolving log topics to event descriptors and decoding parameters
//! - Loading extra signatures from TOML

pub mod abi;
pub mod enrich;
pub mod lookup;

// Re-export main types and functions
pub use abi::{decode_event, event_from_params, value_to_json, ParamSpec};
pub use enrich::{decode_log, enrich_tree, method_label, selector_of, EnrichStats};
pub use lookup::{
    load_signatures, parse_signatures, EventDescriptor, EventSpec, LogParser, SignatureFile,
    SignatureLookup, SignatureTable,
};
