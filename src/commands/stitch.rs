//! Stitch command implementation.
//!
//! The stitch command:
//! 1. Reads the three input files
//! 2. Parses steps, call tree and receipt logs
//! 3. Derives event paths from the step trace
//! 4. Attaches receipt logs to call nodes
//! 5. Resolves method names and decodes events
//! 6. Writes the report

use super::models::StitchArgs;
use crate::enricher::{enrich_tree, load_signatures, SignatureTable};
use crate::output::{render_tree_summary, write_report};
use crate::parser::{
    parse_call_tree, parse_receipt_logs, parse_step_trace, read_json_file, StitchReport,
};
use crate::stitcher::{derive_event_paths, stitch, StitchMode};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;

/// Execute the stitch command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Stitch command arguments
///
/// # Returns
/// The report that was written to `args.output_json`
///
/// # Errors
/// * Unreadable or malformed input files
/// * Invalid signature table
/// * Reconciliation warnings in strict mode
/// * File write errors
pub fn execute_stitch(args: StitchArgs) -> Result<StitchReport> {
    let start_time = Instant::now();

    match &args.transaction_hash {
        Some(tx) => info!("Starting stitch for transaction: {}", tx),
        None => info!("Starting stitch"),
    }

    // Step 1: Read inputs
    info!("Step 1/6: Reading input files...");
    let raw_trace = read_json_file(&args.trace_path)
        .with_context(|| format!("Failed to read step trace {}", args.trace_path.display()))?;
    let raw_calls = read_json_file(&args.calls_path)
        .with_context(|| format!("Failed to read call tree {}", args.calls_path.display()))?;
    let raw_receipt = read_json_file(&args.receipt_path)
        .with_context(|| format!("Failed to read receipt {}", args.receipt_path.display()))?;

    // Step 2: Parse inputs
    info!("Step 2/6: Parsing inputs...");
    let steps = parse_step_trace(&raw_trace).context("Failed to parse step trace")?;
    let mut tree = parse_call_tree(&raw_calls).context("Failed to parse call tree")?;
    let logs = parse_receipt_logs(&raw_receipt).context("Failed to parse receipt logs")?;

    debug!(
        "Parsed {} steps, {} call nodes, {} receipt logs",
        steps.len(),
        tree.node_count(),
        logs.len()
    );

    // Step 3: Derive event paths
    info!("Step 3/6: Deriving event paths...");
    let derived = derive_event_paths(&steps);
    info!(
        "Derived {} events ({} dropped by reverts, {} frames entered)",
        derived.len(),
        derived.stats.dropped_logs,
        derived.stats.frames_entered
    );

    // Step 4: Stitch
    let mode = if args.lenient {
        StitchMode::Lenient
    } else {
        StitchMode::Strict
    };
    info!("Step 4/6: Attaching receipt logs ({:?} mode)...", mode);
    let outcome =
        stitch(&mut tree, &derived.events, &logs, mode).context("Failed to stitch receipt logs")?;

    if !outcome.warnings.is_empty() {
        warn!("Stitching finished with {} warning(s)", outcome.warnings.len());
    }

    // Step 5: Enrich
    info!("Step 5/6: Resolving methods and events...");
    let table = build_signature_table(args.builtin_signatures, args.signatures.as_deref())?;
    let stats = enrich_tree(&mut tree, &table);
    debug!(
        "Enrichment: {}/{} methods resolved, {}/{} events decoded",
        stats.resolved_methods,
        stats.resolved_methods + stats.unresolved_methods,
        stats.decoded_events,
        stats.decoded_events + stats.raw_events
    );

    // Step 6: Write report
    info!("Step 6/6: Writing report...");
    let report = StitchReport {
        version: SCHEMA_VERSION.to_string(),
        transaction_hash: args.transaction_hash.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        alignment: outcome.alignment,
        derived_events: outcome.derived_events,
        receipt_logs: outcome.receipt_logs,
        attached_logs: outcome.attached_logs,
        warnings: outcome.warning_lines(),
        call_tree: tree,
    };

    write_report(&report, &args.output_json).context("Failed to write report JSON")?;

    info!("✓ Report written to: {}", args.output_json.display());

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("STITCH SUMMARY");
        println!("{}", "=".repeat(80));
        if let Some(tx) = &report.transaction_hash {
            println!("Transaction:    {}", tx);
        }
        println!("Derived Events: {}", report.derived_events);
        println!("Receipt Logs:   {}", report.receipt_logs);
        println!("Attached Logs:  {}", report.attached_logs);
        println!("Warnings:       {}", report.warnings.len());
        for line in &report.warnings {
            println!("  - {}", line);
        }
        println!("\n{}", render_tree_summary(&report.call_tree));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Stitch completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Assemble the lookup table from the built-ins and an optional TOML file
///
/// **Public** - shared with tests and library callers
pub fn build_signature_table(builtin: bool, extra: Option<&Path>) -> Result<SignatureTable> {
    let mut table = if builtin {
        SignatureTable::builtin()
    } else {
        SignatureTable::new()
    };

    if let Some(path) = extra {
        let file = load_signatures(path)
            .with_context(|| format!("Failed to load signatures from {}", path.display()))?;
        table
            .extend(file)
            .with_context(|| format!("Invalid signature table {}", path.display()))?;
    }

    debug!(
        "Signature table: {} methods, {} events",
        table.method_count(),
        table.event_count()
    );

    Ok(table)
}

/// Validate stitch arguments
///
/// **Public** - can be called before execute_stitch for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &StitchArgs) -> Result<()> {
    for (label, path) in [
        ("Step trace", &args.trace_path),
        ("Call tree", &args.calls_path),
        ("Receipt", &args.receipt_path),
    ] {
        if !path.is_file() {
            anyhow::bail!("{} file not found: {}", label, path.display());
        }
    }

    if let Some(path) = &args.signatures {
        if !path.is_file() {
            anyhow::bail!("Signature file not found: {}", path.display());
        }
    }

    if args.output_json.as_os_str().is_empty() {
        anyhow::bail!("Output path cannot be empty");
    }

    // Basic hex validation (with or without 0x prefix)
    if let Some(tx) = &args.transaction_hash {
        let tx_hash = tx.strip_prefix("0x").unwrap_or(tx);

        if tx_hash.len() != 64 {
            anyhow::bail!("Transaction hash must be 32 bytes (64 hex characters)");
        }

        if !tx_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Transaction hash contains invalid characters");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn input_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        file
    }

    fn valid_args(trace: &NamedTempFile, calls: &NamedTempFile, receipt: &NamedTempFile) -> StitchArgs {
        StitchArgs {
            trace_path: trace.path().to_path_buf(),
            calls_path: calls.path().to_path_buf(),
            receipt_path: receipt.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_args_valid() {
        let (trace, calls, receipt) = (input_file(), input_file(), input_file());
        let args = StitchArgs {
            transaction_hash: Some(
                "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef".to_string(),
            ),
            ..valid_args(&trace, &calls, &receipt)
        };

        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_missing_input() {
        let (trace, calls) = (input_file(), input_file());
        let args = StitchArgs {
            trace_path: trace.path().to_path_buf(),
            calls_path: calls.path().to_path_buf(),
            receipt_path: "/nonexistent/receipt.json".into(),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_input_is_directory() {
        let dir = TempDir::new().unwrap();
        let (calls, receipt) = (input_file(), input_file());
        let args = StitchArgs {
            trace_path: dir.path().to_path_buf(),
            calls_path: calls.path().to_path_buf(),
            receipt_path: receipt.path().to_path_buf(),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_short_tx_hash() {
        let (trace, calls, receipt) = (input_file(), input_file(), input_file());
        let args = StitchArgs {
            transaction_hash: Some("0x1234".to_string()),
            ..valid_args(&trace, &calls, &receipt)
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_invalid_hex() {
        let (trace, calls, receipt) = (input_file(), input_file(), input_file());
        let args = StitchArgs {
            transaction_hash: Some(
                "0xGGGG567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef".to_string(),
            ),
            ..valid_args(&trace, &calls, &receipt)
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_signature_file() {
        let (trace, calls, receipt) = (input_file(), input_file(), input_file());
        let args = StitchArgs {
            signatures: Some("/nonexistent/sigs.toml".into()),
            ..valid_args(&trace, &calls, &receipt)
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_build_signature_table_without_builtins() {
        let table = build_signature_table(false, None).unwrap();
        assert_eq!(table.method_count(), 0);
        assert_eq!(table.event_count(), 0);
    }

    #[test]
    fn test_build_signature_table_rejects_bad_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[methods]\n\"0x12\" = \"short\"\n").unwrap();

        assert!(build_signature_table(true, Some(file.path())).is_err());
    }
}
