//! Transaction receipt log parser.

use super::unwrap_rpc_envelope;
use crate::utils::config::LOG_FIELD_NAMES;
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// One entry of the receipt's ordered log list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    /// Emitting contract address
    pub address: String,

    /// Indexed topics; the first is the event signature hash
    #[serde(default)]
    pub topics: Vec<String>,

    /// Non-indexed payload as 0x-prefixed hex
    #[serde(default)]
    pub data: String,
}

impl ReceiptLog {
    pub fn new(address: impl Into<String>, topics: Vec<String>, data: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            topics,
            data: data.into(),
        }
    }

    /// Event signature hash (first topic), absent for LOG0
    pub fn topic0(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }
}

/// Parse the receipt log list
///
/// Accepts a full receipt object, a bare array of logs, or either wrapped
/// in a JSON-RPC envelope.
///
/// # Errors
/// * `ParseError::InvalidFormat` - No log list found, or every log failed to parse
pub fn parse_receipt_logs(raw_receipt: &serde_json::Value) -> Result<Vec<ReceiptLog>, ParseError> {
    let receipt = unwrap_rpc_envelope(raw_receipt);

    let logs_array = match receipt {
        serde_json::Value::Array(logs) => logs.as_slice(),
        serde_json::Value::Object(obj) => LOG_FIELD_NAMES
            .iter()
            .find_map(|field| obj.get(*field).and_then(|v| v.as_array()))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ParseError::InvalidFormat("Receipt object has no logs array".to_string())
            })?,
        _ => {
            return Err(ParseError::InvalidFormat(
                "Receipt must be a JSON object or array".to_string(),
            ))
        }
    };

    let mut logs = Vec::with_capacity(logs_array.len());
    for (index, log_value) in logs_array.iter().enumerate() {
        match ReceiptLog::deserialize(log_value) {
            Ok(log) => logs.push(log),
            Err(e) => warn!("Failed to parse receipt log {}: {}", index, e),
        }
    }

    if logs.is_empty() && !logs_array.is_empty() {
        return Err(ParseError::InvalidFormat(
            "All receipt logs failed to parse".to_string(),
        ));
    }

    debug!("Parsed {} receipt logs", logs.len());
    Ok(logs)
}
