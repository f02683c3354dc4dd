//! Configuration and constants for the stitcher.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Field names for trace parsing (different RPC implementations use different names)
pub const STEP_FIELD_NAMES: &[&str] = &["structLogs", "struct_logs", "steps", "trace", "result"];

// Receipt envelopes carry the log list under one of these
pub const LOG_FIELD_NAMES: &[&str] = &["logs"];

/// Opcodes that open a new call frame when the callee has code
pub const CALL_OPCODES: &[&str] = &["CALL", "CALLCODE", "DELEGATECALL", "STATICCALL"];

/// Opcodes that open a new frame running init code
pub const CREATE_OPCODES: &[&str] = &["CREATE", "CREATE2"];

/// Call kinds whose logs are emitted under the caller's address
pub const CALLER_CONTEXT_CALL_TYPES: &[&str] = &["DELEGATECALL", "CALLCODE"];

/// Label used when a call's input is missing or too short to carry a selector
pub const UNKNOWN_METHOD: &str = "unknown";

/// Selector width in hex characters (4 bytes), excluding the 0x prefix
pub const SELECTOR_HEX_LEN: usize = 8;

/// ABI word width in hex characters (32 bytes)
pub const WORD_HEX_LEN: usize = 64;

/// Where per-node `withLog` tracer logs are kept, clear of attached logs
pub const TRACER_LOGS_FIELD: &str = "tracerLogs";
