//! Output JSON schema definitions for stitch reports.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use super::call_tree::CallTree;
use serde::{Deserialize, Serialize};

/// How receipt logs were paired with derived events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Counts agreed; every pairing is backed by the trace's structure
    PathMatched,
    /// Counts disagreed; logs were paired by global order only
    Sequential,
}

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Transaction the inputs belong to, if the caller named it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,

    /// Timestamp when the report was generated
    pub generated_at: String,

    pub alignment: Alignment,

    /// Retained (non-reverted) log steps derived from the trace
    pub derived_events: usize,

    /// Logs listed in the receipt
    pub receipt_logs: usize,

    /// Logs attached to call nodes
    pub attached_logs: usize,

    /// The annotated call tree
    pub call_tree: CallTree,

    /// Every reconciliation anomaly, one line each
    pub warnings: Vec<String>,
}
