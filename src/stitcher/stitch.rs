//! Attach receipt logs to the call nodes that emitted them.
//!
//! Derived events and receipt logs are both in global emission order, so
//! the i-th event pairs with the i-th log. The event's path picks the node;
//! the node's call semantics say which address the log should carry.
//! Every anomaly becomes a [`StitchWarning`]; whether warnings fail the run
//! is decided by [`StitchMode`].

use super::event_path::EventRecord;
use super::indexer::{assign_paths, CallTreeIndex};
use super::path::CallPath;
use crate::parser::call_tree::{AttachedLog, CallNode, CallTree};
use crate::parser::receipt::ReceiptLog;
use crate::parser::schema::Alignment;
use crate::utils::error::StitchError;
use log::{debug, info, warn};
use std::collections::HashMap;
use thiserror::Error;

/// What to do when stitching produced warnings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StitchMode {
    /// Any warning fails the run
    #[default]
    Strict,
    /// Return the partially stitched tree alongside the warnings
    Lenient,
}

/// A reconciliation anomaly between the trace, the call tree and the receipt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StitchWarning {
    #[error(
        "Count mismatch: {events} derived event(s) vs {logs} receipt log(s); \
         falling back to best-effort sequential pairing instead of path-matched alignment"
    )]
    CountMismatch { events: usize, logs: usize },

    #[error("Structural mismatch: no call node at path {path} for receipt log #{log_index}")]
    StructuralMismatch { path: CallPath, log_index: usize },

    #[error(
        "Address mismatch at path {path}: receipt log #{log_index} emitted by {actual}, \
         expected {expected} for {call_type} call"
    )]
    AddressMismatch {
        path: CallPath,
        log_index: usize,
        call_type: String,
        expected: String,
        actual: String,
    },

    #[error(
        "Topic count mismatch at path {path}: receipt log #{log_index} has {actual} topic(s), \
         trace emitted {opcode}"
    )]
    TopicCountMismatch {
        path: CallPath,
        log_index: usize,
        opcode: String,
        actual: usize,
    },

    #[error("Unmapped leftover: receipt log #{log_index} from {address} has no derived event")]
    UnmappedLeftover { log_index: usize, address: String },
}

/// Result of a stitch run that was allowed to complete
#[derive(Debug, Clone)]
pub struct StitchOutcome {
    pub alignment: Alignment,
    pub derived_events: usize,
    pub receipt_logs: usize,
    pub attached_logs: usize,
    pub warnings: Vec<StitchWarning>,
}

impl StitchOutcome {
    /// Warning text, one line per anomaly
    pub fn warning_lines(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Attach receipt logs to call nodes
///
/// **Public** - main entry point for stitching
///
/// # Arguments
/// * `tree` - Call tree, mutated in place (paths always, logs on success)
/// * `events` - Finalized events from the deriver, in emission order
/// * `logs` - Receipt logs, in receipt order
/// * `mode` - Whether warnings fail the run
///
/// # Errors
/// * `StitchError::Aggregate` - Strict mode and at least one warning; the
///   tree's attached-log lists are left untouched
pub fn stitch(
    tree: &mut CallTree,
    events: &[EventRecord],
    logs: &[ReceiptLog],
    mode: StitchMode,
) -> Result<StitchOutcome, StitchError> {
    assign_paths(tree);

    let (attachments, warnings) = {
        let index = CallTreeIndex::build(tree);
        pair_events(&index, events, logs)
    };

    if mode == StitchMode::Strict && !warnings.is_empty() {
        return Err(aggregate_warnings(&warnings));
    }

    let attached_logs = apply_attachments(tree, attachments);
    let alignment = if events.len() == logs.len() {
        Alignment::PathMatched
    } else {
        Alignment::Sequential
    };

    info!(
        "Attached {} of {} receipt log(s) with {} warning(s)",
        attached_logs,
        logs.len(),
        warnings.len()
    );

    Ok(StitchOutcome {
        alignment,
        derived_events: events.len(),
        receipt_logs: logs.len(),
        attached_logs,
        warnings,
    })
}

/// Pair events with logs by global position
///
/// **Private** - produces attachments keyed by path without touching the tree
fn pair_events(
    index: &CallTreeIndex<'_>,
    events: &[EventRecord],
    logs: &[ReceiptLog],
) -> (HashMap<CallPath, Vec<AttachedLog>>, Vec<StitchWarning>) {
    let mut warnings = Vec::new();
    let mut attachments: HashMap<CallPath, Vec<AttachedLog>> = HashMap::new();

    if events.len() != logs.len() {
        record(
            &mut warnings,
            StitchWarning::CountMismatch {
                events: events.len(),
                logs: logs.len(),
            },
        );
    }

    for (log_index, (event, log)) in events.iter().zip(logs).enumerate() {
        let Some(node) = index.get(&event.path) else {
            record(
                &mut warnings,
                StitchWarning::StructuralMismatch {
                    path: event.path.clone(),
                    log_index,
                },
            );
            continue;
        };

        if let Some(warning) = check_emitter(node, event, log, log_index) {
            record(&mut warnings, warning);
        }
        if let Some(warning) = check_topic_count(event, log, log_index) {
            record(&mut warnings, warning);
        }

        let slot = attachments.entry(event.path.clone()).or_default();
        let ordinal = event.ordinal.unwrap_or(slot.len());
        slot.push(AttachedLog::from_receipt(log, log_index, ordinal));
    }

    for (log_index, log) in logs.iter().enumerate().skip(events.len()) {
        record(
            &mut warnings,
            StitchWarning::UnmappedLeftover {
                log_index,
                address: log.address.clone(),
            },
        );
    }

    if events.len() > logs.len() {
        debug!(
            "{} derived event(s) had no receipt log to pair with",
            events.len() - logs.len()
        );
    }

    (attachments, warnings)
}

/// Check the log's address against the node's call semantics
///
/// **Private** - non-fatal sanity check
fn check_emitter(
    node: &CallNode,
    event: &EventRecord,
    log: &ReceiptLog,
    log_index: usize,
) -> Option<StitchWarning> {
    let expected = node.expected_emitter();
    if expected.is_some_and(|addr| addr.eq_ignore_ascii_case(&log.address)) {
        return None;
    }

    Some(StitchWarning::AddressMismatch {
        path: event.path.clone(),
        log_index,
        call_type: node.call_kind(),
        expected: expected.unwrap_or("<none>").to_string(),
        actual: log.address.clone(),
    })
}

/// Check that a LOGn step paired with a log carrying n topics
///
/// **Private** - non-fatal sanity check
fn check_topic_count(
    event: &EventRecord,
    log: &ReceiptLog,
    log_index: usize,
) -> Option<StitchWarning> {
    let expected = event.topic_count()?;
    if expected == log.topics.len() {
        return None;
    }

    Some(StitchWarning::TopicCountMismatch {
        path: event.path.clone(),
        log_index,
        opcode: event.opcode.clone(),
        actual: log.topics.len(),
    })
}

/// Reset every node's log list and attach the paired logs
///
/// **Private** - returns the number of logs attached
fn apply_attachments(
    tree: &mut CallTree,
    mut attachments: HashMap<CallPath, Vec<AttachedLog>>,
) -> usize {
    let mut attached = 0;
    tree.for_each_mut(|node| {
        node.logs = attachments.remove(&node.path).unwrap_or_default();
        attached += node.logs.len();
    });
    attached
}

fn record(warnings: &mut Vec<StitchWarning>, warning: StitchWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}

fn aggregate_warnings(warnings: &[StitchWarning]) -> StitchError {
    let lines = warnings
        .iter()
        .map(|w| format!("  - {w}"))
        .collect::<Vec<_>>()
        .join("\n");

    StitchError::Aggregate {
        count: warnings.len(),
        lines,
    }
}
