use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a stitch report JSON file
pub fn validate_report_file(file_path: &Path) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    if report.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported report version {} (expected {})",
            report.version,
            SCHEMA_VERSION
        );
    }

    let stored = report.call_tree.attached_log_count();
    if stored != report.attached_logs {
        anyhow::bail!(
            "Report claims {} attached logs but the call tree holds {}",
            report.attached_logs,
            stored
        );
    }

    println!("✓ Valid stitch report");
    println!("  Version: {}", report.version);
    if let Some(tx) = &report.transaction_hash {
        println!("  Transaction: {}", tx);
    }
    println!("  Alignment: {:?}", report.alignment);
    println!("  Call Nodes: {}", report.call_tree.node_count());
    println!(
        "  Attached Logs: {}/{}",
        report.attached_logs, report.receipt_logs
    );
    println!("  Warnings: {}", report.warnings.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Trace Log Stitcher Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string           - Schema version (e.g., '1.0.0')");
        println!("  transaction_hash: string? - Transaction hash, if given");
        println!("  generated_at: string      - RFC 3339 timestamp");
        println!("  alignment: string         - 'path_matched' or 'sequential'");
        println!("  derived_events: number    - Retained log steps from the trace");
        println!("  receipt_logs: number      - Logs in the receipt");
        println!("  attached_logs: number     - Logs attached to call nodes");
        println!("  call_tree: object|array   - callTracer tree, annotated per node:");
        println!("    path: string            - Child indices from the root ('' = root)");
        println!("    method: string          - Resolved name, raw selector or 'unknown'");
        println!("    logs: array             - Attached receipt logs");
        println!("      logIndex: number      - Position in the receipt");
        println!("      ordinal: number       - Position among this call's logs");
        println!("      event: object         - {{name, params}} or raw {{topics, data}}");
        println!("  warnings: array           - One line per reconciliation anomaly");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Trace Log Stitcher v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Attaches EVM receipt logs to the calls that emitted them.");
}
