use pretty_assertions::assert_eq;
use trace_log_stitcher::parser::{Alignment, CallNode, CallTree, ReceiptLog, Step};
use trace_log_stitcher::stitcher::{
    derive_event_paths, reconcile, stitch, CallPath, StitchMode, StitchWarning,
};
use trace_log_stitcher::utils::StitchError;

fn step(op: &str, depth: u32) -> Step {
    Step::new(op, depth, 0)
}

fn log(address: &str) -> ReceiptLog {
    ReceiptLog::new(address, vec!["0xtopic".to_string()], "0x")
}

fn root_with_children(children: Vec<CallNode>) -> CallTree {
    CallTree::Single(CallNode::new("CALL", "0xeoa", "0xroot").with_calls(children))
}

#[test]
fn test_reverted_child_leaves_receipt_log_unmatched() {
    let steps = vec![
        step("CALL", 1),
        step("LOG1", 2),
        step("REVERT", 2),
        step("STOP", 1),
    ];
    let logs = vec![log("0xchild")];

    let derived = derive_event_paths(&steps);
    assert!(derived.is_empty());

    // Strict: aggregated failure, tree untouched
    let mut tree = root_with_children(vec![CallNode::new("CALL", "0xroot", "0xchild")]);
    let err = stitch(&mut tree, &derived.events, &logs, StitchMode::Strict).unwrap_err();
    match &err {
        StitchError::Aggregate { count, lines } => {
            assert_eq!(*count, 2);
            assert!(lines.contains("Count mismatch: 0 derived event(s) vs 1 receipt log(s)"));
        }
    }
    assert_eq!(tree.attached_log_count(), 0);

    // Lenient: same warnings, nothing attached
    let mut tree = root_with_children(vec![CallNode::new("CALL", "0xroot", "0xchild")]);
    let outcome = stitch(&mut tree, &derived.events, &logs, StitchMode::Lenient).unwrap();

    assert_eq!(
        outcome.warnings,
        vec![
            StitchWarning::CountMismatch { events: 0, logs: 1 },
            StitchWarning::UnmappedLeftover {
                log_index: 0,
                address: "0xchild".to_string(),
            },
        ]
    );
    assert_eq!(outcome.attached_logs, 0);
    assert_eq!(outcome.alignment, Alignment::Sequential);
    assert_eq!(tree.attached_log_count(), 0);
}

#[test]
fn test_sibling_calls_each_get_their_log() {
    let steps = vec![
        step("CALL", 1),
        step("LOG1", 2),
        step("STOP", 2),
        step("CALL", 1),
        step("LOG1", 2),
        step("STOP", 2),
        step("STOP", 1),
    ];
    let mut tree = root_with_children(vec![
        CallNode::new("CALL", "0xroot", "0xaaaa"),
        CallNode::new("CALL", "0xroot", "0xbbbb"),
    ]);
    let logs = vec![log("0xaaaa"), log("0xbbbb")];

    let outcome = reconcile(&steps, &mut tree, &logs, StitchMode::Strict).unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.alignment, Alignment::PathMatched);

    let first = tree.find(&CallPath::from(vec![0])).unwrap();
    let second = tree.find(&CallPath::from(vec![1])).unwrap();
    assert_eq!(first.logs.len(), 1);
    assert_eq!(first.logs[0].address, "0xaaaa");
    assert_eq!(first.logs[0].log_index, 0);
    assert_eq!(second.logs.len(), 1);
    assert_eq!(second.logs[0].address, "0xbbbb");
    assert_eq!(second.logs[0].log_index, 1);
    assert!(tree.roots()[0].logs.is_empty());
}

fn delegatecall_steps() -> Vec<Step> {
    vec![
        step("DELEGATECALL", 1),
        step("LOG1", 2),
        step("RETURN", 2),
        step("STOP", 1),
    ]
}

fn delegatecall_tree() -> CallTree {
    root_with_children(vec![CallNode::new("DELEGATECALL", "0xproxy", "0ximpl")])
}

#[test]
fn test_delegatecall_log_under_caller_address() {
    let mut tree = delegatecall_tree();
    let logs = vec![log("0xPROXY")];

    let outcome = reconcile(&delegatecall_steps(), &mut tree, &logs, StitchMode::Strict).unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(tree.find(&CallPath::from(vec![0])).unwrap().logs.len(), 1);
}

#[test]
fn test_delegatecall_log_under_target_address_mismatches() {
    let mut tree = delegatecall_tree();
    let logs = vec![log("0ximpl")];

    let outcome = reconcile(&delegatecall_steps(), &mut tree, &logs, StitchMode::Lenient).unwrap();

    assert_eq!(
        outcome.warnings,
        vec![StitchWarning::AddressMismatch {
            path: CallPath::from(vec![0]),
            log_index: 0,
            call_type: "DELEGATECALL".to_string(),
            expected: "0xproxy".to_string(),
            actual: "0ximpl".to_string(),
        }]
    );
    // Lenient mode still attaches the log where the trace put it
    assert_eq!(outcome.attached_logs, 1);
}

#[test]
fn test_no_logs_anywhere() {
    let steps = vec![step("CALL", 1), step("SLOAD", 2), step("STOP", 2), step("STOP", 1)];
    let mut tree = root_with_children(vec![CallNode::new("CALL", "0xroot", "0xchild")]);

    let outcome = reconcile(&steps, &mut tree, &[], StitchMode::Strict).unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.attached_logs, 0);
    assert_eq!(tree.attached_log_count(), 0);
}

#[test]
fn test_equal_counts_attach_every_log_once_in_order() {
    let steps = vec![
        step("LOG1", 1),
        step("CALL", 1),
        step("LOG1", 2),
        step("STATICCALL", 2),
        step("STOP", 3),
        step("CALL", 2),
        step("LOG1", 3),
        step("LOG1", 3),
        step("STOP", 3),
        step("STOP", 2),
        step("LOG1", 1),
    ];
    let mut tree = root_with_children(vec![CallNode::new("CALL", "0xroot", "0xa").with_calls(vec![
        CallNode::new("STATICCALL", "0xa", "0xb"),
        CallNode::new("CALL", "0xa", "0xc"),
    ])]);
    let logs = vec![
        log("0xroot"),
        log("0xa"),
        log("0xc"),
        log("0xc"),
        log("0xroot"),
    ];

    let outcome = reconcile(&steps, &mut tree, &logs, StitchMode::Strict).unwrap();
    assert_eq!(outcome.attached_logs, logs.len());

    let mut seen: Vec<(usize, CallPath, usize)> = Vec::new();
    tree.for_each_mut(|node| {
        for attached in &node.logs {
            seen.push((attached.log_index, node.path.clone(), attached.ordinal));
        }
    });
    seen.sort();

    assert_eq!(
        seen,
        vec![
            (0, CallPath::root(), 0),
            (1, CallPath::from(vec![0]), 0),
            (2, CallPath::from(vec![0, 1]), 0),
            (3, CallPath::from(vec![0, 1]), 1),
            (4, CallPath::root(), 1),
        ]
    );
}

#[test]
fn test_surplus_events_pair_sequentially() {
    let steps = vec![step("LOG1", 1), step("LOG1", 1)];
    let mut tree = CallTree::Single(CallNode::new("CALL", "0xeoa", "0xroot"));
    let logs = vec![log("0xroot")];

    let outcome = reconcile(&steps, &mut tree, &logs, StitchMode::Lenient).unwrap();

    assert_eq!(outcome.alignment, Alignment::Sequential);
    assert_eq!(
        outcome.warnings,
        vec![StitchWarning::CountMismatch { events: 2, logs: 1 }]
    );
    assert_eq!(outcome.attached_logs, 1);
    assert_eq!(tree.roots()[0].logs[0].log_index, 0);
}

#[test]
fn test_topic_count_mismatch_is_reported() {
    let steps = vec![step("LOG3", 1)];
    let mut tree = CallTree::Single(CallNode::new("CALL", "0xeoa", "0xroot"));
    let logs = vec![log("0xroot")];

    let outcome = reconcile(&steps, &mut tree, &logs, StitchMode::Lenient).unwrap();

    assert_eq!(
        outcome.warnings,
        vec![StitchWarning::TopicCountMismatch {
            path: CallPath::root(),
            log_index: 0,
            opcode: "LOG3".to_string(),
            actual: 1,
        }]
    );
}

#[test]
fn test_forest_roots_are_indexed_by_position() {
    let steps = vec![
        step("CALL", 1),
        step("STOP", 2),
        step("CALL", 1),
        step("LOG1", 2),
        step("STOP", 2),
    ];
    let mut tree = CallTree::Forest(vec![
        CallNode::new("CALL", "0xeoa", "0xa"),
        CallNode::new("CALL", "0xeoa", "0xb"),
    ]);
    let logs = vec![log("0xb")];

    let outcome = reconcile(&steps, &mut tree, &logs, StitchMode::Strict).unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(tree.roots()[1].logs.len(), 1);
}
