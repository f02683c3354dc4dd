//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod stitch;
pub mod utils;

// Re-export main command functions
pub use models::StitchArgs;
pub use stitch::{build_signature_table, execute_stitch, validate_args};
pub use utils::{display_schema, display_version, validate_report_file};
