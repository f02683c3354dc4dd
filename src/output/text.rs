//! Plain-text rendering of an annotated call tree.

use crate::parser::call_tree::{AttachedLog, CallNode, CallTree, DecodedEvent};
use crate::utils::config::UNKNOWN_METHOD;

/// Render the tree as one indented line per call and per attached log
///
/// **Public** - used by the stitch command's `--summary` output
///
/// # Example
/// ```text
/// root CALL transfer 0xaa -> 0xbb (1 log)
///   • log #0 Transfer
///   0 DELEGATECALL 0x70a08231 0xbb -> 0xcc (0 logs)
/// ```
pub fn render_tree_summary(tree: &CallTree) -> String {
    let mut lines = Vec::new();
    for root in tree.roots() {
        render_node(root, 0, &mut lines);
    }
    lines.join("\n")
}

/// **Private** - recursive helper for render_tree_summary
fn render_node(node: &CallNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let log_count = node.logs.len();

    lines.push(format!(
        "{}{} {} {} {} -> {} ({} log{})",
        indent,
        node.path,
        node.call_kind(),
        node.method.as_deref().unwrap_or(UNKNOWN_METHOD),
        node.from.as_deref().unwrap_or("?"),
        node.to.as_deref().unwrap_or("?"),
        log_count,
        if log_count == 1 { "" } else { "s" }
    ));

    for log in &node.logs {
        lines.push(format!("{}  • log #{} {}", indent, log.log_index, event_label(log)));
    }

    for child in &node.calls {
        render_node(child, depth + 1, lines);
    }
}

fn event_label(log: &AttachedLog) -> String {
    match &log.event {
        Some(DecodedEvent::Decoded { name, .. }) => name.clone(),
        _ => log
            .topics
            .first()
            .cloned()
            .unwrap_or_else(|| "anonymous".to_string()),
    }
}
