//! Reconciliation of step traces, call trees and receipt logs.
//!
//! This module transforms the three raw inputs into an annotated tree:
//! - Event paths derived from the step trace (which frame emitted each log)
//! - A path index over the call tree
//! - Receipt logs attached to the nodes that emitted them

pub mod event_path;
pub mod indexer;
pub mod path;
pub mod stitch;

// Re-export main types and functions
pub use event_path::{derive_event_paths, DerivationStats, DerivedEvents, EventRecord};
pub use indexer::{assign_paths, CallTreeIndex};
pub use path::CallPath;
pub use stitch::{stitch, StitchMode, StitchOutcome, StitchWarning};

use crate::parser::call_tree::CallTree;
use crate::parser::receipt::ReceiptLog;
use crate::parser::trace::Step;
use crate::utils::error::StitchError;

/// Derive event paths from `steps` and stitch `logs` onto `tree`
///
/// **Public** - convenience wrapper over [`derive_event_paths`] and [`stitch`]
pub fn reconcile(
    steps: &[Step],
    tree: &mut CallTree,
    logs: &[ReceiptLog],
    mode: StitchMode,
) -> Result<StitchOutcome, StitchError> {
    let derived = derive_event_paths(steps);
    stitch(tree, &derived.events, logs, mode)
}
