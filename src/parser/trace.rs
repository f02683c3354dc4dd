//! Opcode step trace parser.
//!
//! Parses raw JSON from an opcode-level debug_traceTransaction into
//! an ordered list of execution steps.

use super::unwrap_rpc_envelope;
use crate::utils::config::{CALL_OPCODES, CREATE_OPCODES, STEP_FIELD_NAMES};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Raw execution step from the struct logger
///
/// Only the fields needed to replay call structure are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Opcode mnemonic
    #[serde(alias = "name")]
    pub op: String,

    /// Call-stack depth (1-based)
    #[serde(default)]
    pub depth: u32,

    /// Program counter
    #[serde(default)]
    pub pc: u64,

    /// Set by the tracer on the step where the frame halted exceptionally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl Step {
    pub fn new(op: impl Into<String>, depth: u32, pc: u64) -> Self {
        Self {
            op: op.into(),
            depth,
            pc,
            error: None,
        }
    }

    /// Attach a tracer error to this step
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(serde_json::Value::String(error.into()));
        self
    }

    /// Whether this step opens a CALL-family or CREATE-family frame
    pub fn is_frame_opening(&self) -> bool {
        let op = self.op.as_str();
        CALL_OPCODES.contains(&op) || CREATE_OPCODES.contains(&op)
    }

    /// Whether this step emits a log (LOG0..LOG4)
    pub fn is_log(&self) -> bool {
        self.op.starts_with("LOG")
    }

    /// Whether this step ends its frame with a rollback
    pub fn is_revert(&self) -> bool {
        matches!(self.op.as_str(), "REVERT" | "INVALID") || self.has_error()
    }

    fn has_error(&self) -> bool {
        match &self.error {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

/// Parse raw step trace JSON
///
/// Accepts a bare array of steps, an object carrying the array under one
/// of the known field names, or either wrapped in a JSON-RPC envelope.
///
/// # Errors
/// * `ParseError::InvalidFormat` - Trace is neither an object nor an array,
///   or every step failed to parse
pub fn parse_step_trace(raw_trace: &serde_json::Value) -> Result<Vec<Step>, ParseError> {
    let trace = unwrap_rpc_envelope(raw_trace);

    let steps = match trace {
        serde_json::Value::Array(steps_array) => parse_steps_array(steps_array)?,
        serde_json::Value::Object(obj) => {
            if obj.get("failed").and_then(serde_json::Value::as_bool) == Some(true) {
                debug!("Trace reports a failed transaction");
            }
            extract_execution_steps(obj)?
        }
        _ => {
            return Err(ParseError::InvalidFormat(
                "Trace must be a JSON object or array".to_string(),
            ))
        }
    };

    debug!("Parsed {} execution steps", steps.len());
    Ok(steps)
}

/// Extract execution steps from a trace object
///
/// **Private** - internal extraction logic
fn extract_execution_steps(
    trace_obj: &serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<Step>, ParseError> {
    for field in STEP_FIELD_NAMES {
        if let Some(steps_array) = trace_obj.get(*field).and_then(|v| v.as_array()) {
            return parse_steps_array(steps_array);
        }
    }

    // Bare `{"result": {...}}` wrapper without JSON-RPC fields
    if let Some(inner) = trace_obj.get("result").and_then(|v| v.as_object()) {
        return extract_execution_steps(inner);
    }

    // No steps found - valid for plain value transfers
    warn!("No execution steps found in trace");
    Ok(Vec::new())
}

/// Parse array of execution steps
///
/// **Private** - internal parsing logic
fn parse_steps_array(steps_array: &[serde_json::Value]) -> Result<Vec<Step>, ParseError> {
    let mut steps = Vec::with_capacity(steps_array.len());

    for (index, step_value) in steps_array.iter().enumerate() {
        match Step::deserialize(step_value) {
            Ok(step) => steps.push(step),
            Err(e) => {
                // Log but don't fail - some tracers emit partial records
                warn!("Failed to parse step {}: {}", index, e);
            }
        }
    }

    if steps.is_empty() && !steps_array.is_empty() {
        return Err(ParseError::InvalidFormat(
            "All execution steps failed to parse".to_string(),
        ));
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_struct_logs_object() {
        let raw = json!({
            "gas": 21000,
            "failed": false,
            "structLogs": [
                { "pc": 0, "op": "PUSH1", "gas": 100, "gasCost": 3, "depth": 1 },
                { "pc": 2, "op": "CALL", "gas": 97, "gasCost": 40, "depth": 1 }
            ]
        });

        let steps = parse_step_trace(&raw).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1], Step::new("CALL", 1, 2));
    }

    #[test]
    fn test_parse_bare_array_with_name_alias() {
        let raw = json!([{ "name": "LOG1", "depth": 2, "pc": 7 }]);
        let steps = parse_step_trace(&raw).unwrap();
        assert_eq!(steps[0].op, "LOG1");
        assert!(steps[0].is_log());
    }

    #[test]
    fn test_parse_rpc_envelope() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "structLogs": [{ "op": "STOP", "depth": 1, "pc": 0 }] }
        });
        let steps = parse_step_trace(&raw).unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_parse_bare_result_wrapper() {
        let raw = json!({ "result": { "structLogs": [{ "op": "LOG0", "depth": 1 }] } });
        let steps = parse_step_trace(&raw).unwrap();
        assert_eq!(steps, vec![Step::new("LOG0", 1, 0)]);
    }

    #[test]
    fn test_parse_skips_malformed_steps() {
        let raw = json!([{ "depth": 1 }, { "op": "STOP", "depth": 1 }]);
        let steps = parse_step_trace(&raw).unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_parse_all_malformed_fails() {
        let raw = json!([{ "depth": 1 }, { "pc": 3 }]);
        assert!(parse_step_trace(&raw).is_err());
    }

    #[test]
    fn test_parse_rejects_scalar() {
        assert!(parse_step_trace(&json!("nope")).is_err());
    }

    #[test]
    fn test_revert_detection() {
        assert!(Step::new("REVERT", 2, 0).is_revert());
        assert!(Step::new("INVALID", 2, 0).is_revert());
        assert!(Step::new("SSTORE", 2, 0).with_error("out of gas").is_revert());
        assert!(!Step::new("SSTORE", 2, 0).with_error("").is_revert());
        assert!(!Step::new("STOP", 2, 0).is_revert());
    }

    #[test]
    fn test_frame_opening_opcodes() {
        for op in ["CALL", "CALLCODE", "DELEGATECALL", "STATICCALL", "CREATE", "CREATE2"] {
            assert!(Step::new(op, 1, 0).is_frame_opening(), "{op}");
        }
        assert!(!Step::new("RETURN", 1, 0).is_frame_opening());
    }
}
