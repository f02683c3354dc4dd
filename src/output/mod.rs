//! Output writers for stitch reports.
//!
//! This module handles writing data to disk in various formats:
//! - JSON reports (pretty)
//! - Indented text summaries of the annotated call tree

pub mod json;
pub mod text;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report};
pub use text::render_tree_summary;
