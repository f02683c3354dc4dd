//! Call tree types and parser for callTracer output.
//!
//! Nodes are deserialized from the tracer's JSON and then mutated in place
//! by the pipeline: the indexer assigns paths, the stitcher attaches logs
//! and the enricher fills in method names and decoded events.
//! Tracer fields we don't interpret are kept in `extra` and written back out.

use super::receipt::ReceiptLog;
use super::unwrap_rpc_envelope;
use crate::stitcher::path::CallPath;
use crate::utils::config::{CALLER_CONTEXT_CALL_TYPES, TRACER_LOGS_FIELD};
use crate::utils::error::ParseError;
use log::debug;
use serde::{Deserialize, Serialize};

/// A decoded (or deliberately undecoded) receipt log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecodedEvent {
    /// Topic resolved to a known event
    Decoded {
        name: String,
        params: serde_json::Value,
    },
    /// Unknown topic; the raw shape passes through
    Raw { topics: Vec<String>, data: String },
}

/// A receipt log attached to the call that emitted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,

    /// Position in the receipt's log list
    pub log_index: usize,

    /// Position among the logs emitted by this call
    pub ordinal: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<DecodedEvent>,
}

impl AttachedLog {
    pub fn from_receipt(log: &ReceiptLog, log_index: usize, ordinal: usize) -> Self {
        Self {
            address: log.address.clone(),
            topics: log.topics.clone(),
            data: log.data.clone(),
            log_index,
            ordinal,
            event: None,
        }
    }

    /// View of the attached log as the receipt entry it was copied from
    pub fn as_receipt_log(&self) -> ReceiptLog {
        ReceiptLog::new(self.address.clone(), self.topics.clone(), self.data.clone())
    }
}

/// One node of the call tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallNode {
    /// Call kind (CALL, DELEGATECALL, CREATE2, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallNode>,

    /// Structural path, assigned by the indexer
    #[serde(default)]
    pub path: CallPath,

    /// Receipt logs this call emitted, filled in by the stitcher
    #[serde(default)]
    pub logs: Vec<AttachedLog>,

    /// Resolved method name, filled in by the enricher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Tracer fields passed through untouched (gas, gasUsed, value, error, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CallNode {
    pub fn new(call_type: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            call_type: Some(call_type.into()),
            from: Some(from.into()),
            to: Some(to.into()),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_calls(mut self, calls: Vec<CallNode>) -> Self {
        self.calls = calls;
        self
    }

    /// Upper-cased call kind, empty if the tracer omitted it
    pub fn call_kind(&self) -> String {
        self.call_type
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_default()
    }

    /// Address expected to appear on logs this call emits
    ///
    /// DELEGATECALL and CALLCODE run the target's code in the caller's
    /// context, so their logs carry the caller's address.
    pub fn expected_emitter(&self) -> Option<&str> {
        if CALLER_CONTEXT_CALL_TYPES.contains(&self.call_kind().as_str()) {
            self.from.as_deref()
        } else {
            self.to.as_deref()
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.calls.iter().map(CallNode::node_count).sum::<usize>()
    }

    /// Number of logs attached anywhere in this subtree
    pub fn attached_log_count(&self) -> usize {
        self.logs.len()
            + self
                .calls
                .iter()
                .map(CallNode::attached_log_count)
                .sum::<usize>()
    }

    fn descend(&self, indices: &[usize]) -> Option<&CallNode> {
        match indices.split_first() {
            None => Some(self),
            Some((first, rest)) => self.calls.get(*first)?.descend(rest),
        }
    }

    fn descend_mut(&mut self, indices: &[usize]) -> Option<&mut CallNode> {
        match indices.split_first() {
            None => Some(self),
            Some((first, rest)) => self.calls.get_mut(*first)?.descend_mut(rest),
        }
    }
}

/// Call tracer output: one root call, or a forest of top-level calls
///
/// In a forest the roots sit under the virtual root, so the i-th root has
/// path `[i]`; a single root has the empty path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallTree {
    Single(CallNode),
    Forest(Vec<CallNode>),
}

impl CallTree {
    /// Top-level nodes
    pub fn roots(&self) -> &[CallNode] {
        match self {
            Self::Single(root) => std::slice::from_ref(root),
            Self::Forest(roots) => roots,
        }
    }

    pub fn roots_mut(&mut self) -> &mut [CallNode] {
        match self {
            Self::Single(root) => std::slice::from_mut(root),
            Self::Forest(roots) => roots,
        }
    }

    pub fn node_count(&self) -> usize {
        self.roots().iter().map(CallNode::node_count).sum()
    }

    pub fn attached_log_count(&self) -> usize {
        self.roots().iter().map(CallNode::attached_log_count).sum()
    }

    /// Node at `path`, following the tree's path convention
    pub fn find(&self, path: &CallPath) -> Option<&CallNode> {
        match self {
            Self::Single(root) => root.descend(path.indices()),
            Self::Forest(roots) => {
                let (first, rest) = path.indices().split_first()?;
                roots.get(*first)?.descend(rest)
            }
        }
    }

    pub fn find_mut(&mut self, path: &CallPath) -> Option<&mut CallNode> {
        match self {
            Self::Single(root) => root.descend_mut(path.indices()),
            Self::Forest(roots) => {
                let (first, rest) = path.indices().split_first()?;
                roots.get_mut(*first)?.descend_mut(rest)
            }
        }
    }

    /// Visit every node depth-first, parents before children
    pub fn for_each_mut(&mut self, mut visit: impl FnMut(&mut CallNode)) {
        fn walk(node: &mut CallNode, visit: &mut impl FnMut(&mut CallNode)) {
            visit(node);
            for child in &mut node.calls {
                walk(child, visit);
            }
        }

        for root in self.roots_mut() {
            walk(root, &mut visit);
        }
    }
}

/// Parse callTracer JSON into a call tree
///
/// # Errors
/// * `ParseError::InvalidFormat` - Not an object or array
/// * `ParseError::JsonError` - Nodes don't match the call frame shape
pub fn parse_call_tree(raw_tree: &serde_json::Value) -> Result<CallTree, ParseError> {
    let tree = unwrap_bare_result(unwrap_rpc_envelope(raw_tree));

    if !tree.is_object() && !tree.is_array() {
        return Err(ParseError::InvalidFormat(
            "Call tree must be a JSON object or array".to_string(),
        ));
    }

    let mut tree = tree.clone();
    stash_tracer_logs(&mut tree);

    let tree = CallTree::deserialize(tree)?;
    debug!("Parsed call tree with {} nodes", tree.node_count());
    Ok(tree)
}

/// Unwrap a `{"result": ...}` wrapper that carries no JSON-RPC fields
///
/// **Private** - a call frame always has more fields than `result`
fn unwrap_bare_result(value: &serde_json::Value) -> &serde_json::Value {
    match value {
        serde_json::Value::Object(obj) if obj.len() == 1 => match obj.get("result") {
            Some(inner) if inner.is_object() || inner.is_array() => inner,
            _ => value,
        },
        _ => value,
    }
}

/// Move `withLog` tracer logs out of the way of attached logs
///
/// **Private** - they lack receipt indices; kept verbatim in `extra`
fn stash_tracer_logs(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Array(nodes) => nodes.iter_mut().for_each(stash_tracer_logs),
        serde_json::Value::Object(node) => {
            if let Some(logs) = node.remove("logs") {
                node.insert(TRACER_LOGS_FIELD.to_string(), logs);
            }
            if let Some(calls) = node.get_mut("calls") {
                stash_tracer_logs(calls);
            }
        }
        _ => {}
    }
}
