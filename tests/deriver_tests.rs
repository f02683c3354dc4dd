use trace_log_stitcher::parser::Step;
use trace_log_stitcher::stitcher::{derive_event_paths, CallPath};

fn step(op: &str, depth: u32) -> Step {
    Step::new(op, depth, 0)
}

fn paths(steps: &[Step]) -> Vec<CallPath> {
    derive_event_paths(steps)
        .events
        .into_iter()
        .map(|e| e.path)
        .collect()
}

#[test]
fn test_no_reverts_keeps_every_log_at_deepest_frame() {
    let steps = vec![
        step("LOG1", 1),
        step("CALL", 1),
        step("PUSH1", 2),
        step("LOG2", 2),
        step("STATICCALL", 2),
        step("LOG0", 3),
        step("RETURN", 3),
        step("STOP", 2),
        step("LOG3", 1),
        step("STOP", 1),
    ];

    let derived = derive_event_paths(&steps);

    assert_eq!(derived.len(), 4);
    assert_eq!(
        paths(&steps),
        vec![
            CallPath::root(),
            CallPath::from(vec![0]),
            CallPath::from(vec![0, 0]),
            CallPath::root(),
        ]
    );
    assert_eq!(derived.stats.provisional_logs, 4);
    assert_eq!(derived.stats.dropped_logs, 0);
    assert_eq!(derived.stats.frames_entered, 2);
}

#[test]
fn test_reverted_call_with_single_log() {
    let steps = vec![
        step("CALL", 1),
        step("LOG1", 2),
        step("REVERT", 2),
        step("STOP", 1),
    ];

    let derived = derive_event_paths(&steps);

    assert!(derived.is_empty());
    assert_eq!(derived.stats.provisional_logs, 1);
    assert_eq!(derived.stats.dropped_logs, 1);
}

#[test]
fn test_revert_only_drops_its_own_frame() {
    let steps = vec![
        step("LOG1", 1),
        step("CALL", 1),
        step("LOG1", 2),
        step("STOP", 2),
        step("CALL", 1),
        step("LOG1", 2),
        step("REVERT", 2),
        step("CALL", 1),
        step("LOG1", 2),
        step("RETURN", 2),
        step("STOP", 1),
    ];

    assert_eq!(
        paths(&steps),
        vec![
            CallPath::root(),
            CallPath::from(vec![0]),
            CallPath::from(vec![2]),
        ]
    );
}

#[test]
fn test_zero_step_call_consumes_child_index() {
    // First call targets an account without code
    let steps = vec![
        step("CALL", 1),
        step("POP", 1),
        step("CALL", 1),
        step("LOG1", 2),
        step("STOP", 2),
        step("STOP", 1),
    ];

    let derived = derive_event_paths(&steps);

    assert_eq!(paths(&steps), vec![CallPath::from(vec![1])]);
    assert_eq!(derived.stats.zero_step_calls, 1);
    assert_eq!(derived.stats.frames_entered, 1);
}

#[test]
fn test_trailing_call_is_not_entered() {
    let steps = vec![step("LOG0", 1), step("CALL", 1)];

    let derived = derive_event_paths(&steps);

    assert_eq!(derived.len(), 1);
    assert_eq!(derived.stats.zero_step_calls, 1);
}

#[test]
fn test_parent_revert_drops_returned_callee_logs() {
    let steps = vec![
        step("CALL", 1),
        step("DELEGATECALL", 2),
        step("LOG2", 3),
        step("RETURN", 3),
        step("LOG1", 2),
        step("REVERT", 2),
        step("LOG1", 1),
        step("STOP", 1),
    ];

    let derived = derive_event_paths(&steps);

    assert_eq!(paths(&steps), vec![CallPath::root()]);
    assert_eq!(derived.stats.dropped_logs, 2);
}

#[test]
fn test_exceptional_halt_counts_as_revert() {
    let steps = vec![
        step("CALL", 1),
        step("LOG1", 2),
        Step::new("SSTORE", 2, 10).with_error("out of gas"),
        step("CREATE", 1),
        step("LOG0", 2),
        step("INVALID", 2),
        step("STOP", 1),
    ];

    assert!(derive_event_paths(&steps).is_empty());
}

#[test]
fn test_top_level_revert_drops_root_logs() {
    let steps = vec![step("LOG1", 1), step("REVERT", 1)];
    assert!(derive_event_paths(&steps).is_empty());
}

#[test]
fn test_ordinals_count_per_path() {
    let steps = vec![
        step("LOG1", 1),
        step("CALL", 1),
        step("LOG1", 2),
        step("LOG2", 2),
        step("STOP", 2),
        step("LOG1", 1),
    ];

    let ordinals: Vec<(CallPath, Option<usize>)> = derive_event_paths(&steps)
        .events
        .into_iter()
        .map(|e| (e.path, e.ordinal))
        .collect();

    assert_eq!(
        ordinals,
        vec![
            (CallPath::root(), Some(0)),
            (CallPath::from(vec![0]), Some(0)),
            (CallPath::from(vec![0]), Some(1)),
            (CallPath::root(), Some(1)),
        ]
    );
}

#[test]
fn test_empty_trace() {
    let derived = derive_event_paths(&[]);
    assert!(derived.is_empty());
    assert_eq!(derived.stats.frames_entered, 0);
}
