use std::path::PathBuf;

/// Arguments for the stitch command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct StitchArgs {
    /// Step trace JSON (structLogs)
    pub trace_path: PathBuf,

    /// Call tree JSON (callTracer)
    pub calls_path: PathBuf,

    /// Receipt JSON
    pub receipt_path: PathBuf,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Extra signature table (TOML)
    pub signatures: Option<PathBuf>,

    /// Seed the lookup table with the built-in signatures
    pub builtin_signatures: bool,

    /// Report warnings instead of failing on them
    pub lenient: bool,

    /// Transaction hash recorded in the report
    pub transaction_hash: Option<String>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for StitchArgs {
    fn default() -> Self {
        Self {
            trace_path: PathBuf::from("trace.json"),
            calls_path: PathBuf::from("calls.json"),
            receipt_path: PathBuf::from("receipt.json"),
            output_json: PathBuf::from("stitched.json"),
            signatures: None,
            builtin_signatures: true,
            lenient: false,
            transaction_hash: None,
            print_summary: false,
        }
    }
}
