//! Input parsing and report schema definitions.
//!
//! This module handles:
//! - Parsing the opcode step trace
//! - Parsing callTracer output into a mutable call tree
//! - Parsing the receipt log list
//! - Defining the output report schema

pub mod call_tree;
pub mod receipt;
pub mod schema;
pub mod trace;

use crate::utils::error::ParseError;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Re-export main types
pub use call_tree::{parse_call_tree, AttachedLog, CallNode, CallTree, DecodedEvent};
pub use receipt::{parse_receipt_logs, ReceiptLog};
pub use schema::{Alignment, StitchReport};
pub use trace::{parse_step_trace, Step};

/// Read a JSON document from disk
///
/// # Errors
/// * `ParseError::IoError` - File cannot be opened
/// * `ParseError::JsonError` - File is not valid JSON
pub fn read_json_file(path: impl AsRef<Path>) -> Result<serde_json::Value, ParseError> {
    let path = path.as_ref();
    debug!("Reading JSON input from: {}", path.display());

    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(value)
}

/// Strip a JSON-RPC response envelope, if present
///
/// Fetchers often save the whole `{"jsonrpc", "id", "result"}` response;
/// the payload we want is the `result`.
pub(crate) fn unwrap_rpc_envelope(raw: &serde_json::Value) -> &serde_json::Value {
    match raw {
        serde_json::Value::Object(obj)
            if obj.contains_key("result")
                && (obj.contains_key("jsonrpc") || obj.contains_key("id")) =>
        {
            &obj["result"]
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_rpc_envelope() {
        let wrapped = json!({ "jsonrpc": "2.0", "id": 1, "result": [1, 2] });
        assert_eq!(unwrap_rpc_envelope(&wrapped), &json!([1, 2]));

        let bare = json!({ "result": [1] });
        assert_eq!(unwrap_rpc_envelope(&bare), &bare);
    }

    #[test]
    fn test_read_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"{"logs": []}"#).unwrap();

        let value = read_json_file(&path).unwrap();
        assert_eq!(value, json!({ "logs": [] }));
        assert!(read_json_file(dir.path().join("missing.json")).is_err());
    }
}
