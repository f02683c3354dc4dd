//! Derive which call frame emitted each log by replaying the step trace.
//!
//! The struct logger never says "this call entered a new frame" or "this
//! frame's logs were rolled back"; both are inferred from how the depth
//! moves between consecutive steps.
//!
//! # Algorithm
//! 1. Keep a stack of frames, starting with a virtual root at the empty path
//! 2. A CALL/CREATE-family step reserves the next child index of the current
//!    frame; the frame is only pushed if the next step is deeper
//! 3. When depth drops, pop frames; a reverted frame drops its logs, a
//!    successful one hands them to its parent
//! 4. Number the surviving logs per path, keeping execution order

use super::path::CallPath;
use crate::parser::trace::Step;
use log::debug;
use std::collections::HashMap;

/// One log emission inferred from the step trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// LOG0..LOG4
    pub opcode: String,
    pub pc: u64,
    pub depth: u32,

    /// Frame that emitted the log
    pub path: CallPath,

    /// Position among retained events sharing `path`, set on finalization
    pub ordinal: Option<usize>,

    /// Set when an owning frame reverted
    pub dropped: bool,
}

impl EventRecord {
    /// Topic count implied by the opcode, e.g. 3 for LOG3
    pub fn topic_count(&self) -> Option<usize> {
        self.opcode.strip_prefix("LOG")?.parse().ok()
    }
}

/// Counters describing one derivation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivationStats {
    /// LOG steps seen
    pub provisional_logs: usize,
    /// Logs discarded by reverts
    pub dropped_logs: usize,
    /// Call/create reservations confirmed as new frames
    pub frames_entered: usize,
    /// Reservations discarded because depth never increased
    pub zero_step_calls: usize,
}

/// Finalized event records in execution order
#[derive(Debug, Clone, Default)]
pub struct DerivedEvents {
    pub events: Vec<EventRecord>,
    pub stats: DerivationStats,
}

impl DerivedEvents {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Simulated call-stack entry
#[derive(Debug)]
struct Frame {
    path: CallPath,
    next_child: usize,
    /// Indices into the provisional record list owned by this frame
    log_indices: Vec<usize>,
    reverted: bool,
}

impl Frame {
    fn new(path: CallPath) -> Self {
        Self {
            path,
            next_child: 0,
            log_indices: Vec::new(),
            reverted: false,
        }
    }

    /// Take the next child index; it is consumed even if the call never enters
    fn reserve_child(&mut self) -> usize {
        let index = self.next_child;
        self.next_child += 1;
        index
    }
}

/// A call that may or may not open a frame, decided by the next step
#[derive(Debug)]
struct PendingFrame {
    parent_path: CallPath,
    index: usize,
    depth: u32,
}

/// Derive path-addressed event records from a step trace
///
/// **Public** - main entry point for event derivation
///
/// # Arguments
/// * `steps` - Ordered opcode steps
///
/// # Returns
/// Retained event records in execution order, each with its path and
/// per-path ordinal, plus derivation counters
pub fn derive_event_paths(steps: &[Step]) -> DerivedEvents {
    debug!("Deriving event paths from {} steps", steps.len());

    let mut deriver = EventPathDeriver::new();
    for step in steps {
        deriver.process(step);
    }
    deriver.finish()
}

struct EventPathDeriver {
    stack: Vec<Frame>,
    pending: Option<PendingFrame>,
    records: Vec<EventRecord>,
    stats: DerivationStats,
}

impl EventPathDeriver {
    fn new() -> Self {
        Self {
            stack: vec![Frame::new(CallPath::root())],
            pending: None,
            records: Vec::new(),
            stats: DerivationStats::default(),
        }
    }

    fn process(&mut self, step: &Step) {
        self.resolve_pending(step.depth);

        // The root frame is only unwound in finish()
        while self.stack.len() > 1 && self.stack.len() > step.depth as usize {
            self.pop_frame();
        }

        if step.is_log() {
            self.capture_log(step);
        }

        if step.is_revert() {
            if let Some(frame) = self.stack.last_mut() {
                frame.reverted = true;
            }
        }

        if step.is_frame_opening() {
            self.reserve_frame(step.depth);
        }
    }

    /// Confirm or discard the reservation made by the previous step
    fn resolve_pending(&mut self, depth: u32) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        if depth > pending.depth {
            self.stack
                .push(Frame::new(pending.parent_path.child(pending.index)));
            self.stats.frames_entered += 1;
        } else {
            debug!(
                "Call at {} index {} never entered a new frame",
                pending.parent_path, pending.index
            );
            self.stats.zero_step_calls += 1;
        }
    }

    fn reserve_frame(&mut self, depth: u32) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };

        let index = parent.reserve_child();
        self.pending = Some(PendingFrame {
            parent_path: parent.path.clone(),
            index,
            depth,
        });
    }

    fn capture_log(&mut self, step: &Step) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };

        frame.log_indices.push(self.records.len());
        self.records.push(EventRecord {
            opcode: step.op.clone(),
            pc: step.pc,
            depth: step.depth,
            path: frame.path.clone(),
            ordinal: None,
            dropped: false,
        });
        self.stats.provisional_logs += 1;
    }

    fn pop_frame(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };

        if frame.reverted {
            for index in frame.log_indices {
                if let Some(record) = self.records.get_mut(index) {
                    record.dropped = true;
                    self.stats.dropped_logs += 1;
                }
            }
        } else if let Some(parent) = self.stack.last_mut() {
            // A later revert of any ancestor rolls these back too
            parent.log_indices.extend(frame.log_indices);
        }
    }

    fn finish(mut self) -> DerivedEvents {
        if self.pending.take().is_some() {
            debug!("Trace ended with an unconfirmed call, discarding it");
            self.stats.zero_step_calls += 1;
        }

        while !self.stack.is_empty() {
            self.pop_frame();
        }

        let mut ordinals: HashMap<CallPath, usize> = HashMap::new();
        let events: Vec<EventRecord> = self
            .records
            .into_iter()
            .filter(|record| !record.dropped)
            .map(|mut record| {
                let next = ordinals.entry(record.path.clone()).or_insert(0);
                record.ordinal = Some(*next);
                *next += 1;
                record
            })
            .collect();

        debug!(
            "Derived {} events ({} provisional, {} dropped, {} frames, {} zero-step calls)",
            events.len(),
            self.stats.provisional_logs,
            self.stats.dropped_logs,
            self.stats.frames_entered,
            self.stats.zero_step_calls
        );

        DerivedEvents {
            events,
            stats: self.stats,
        }
    }
}
