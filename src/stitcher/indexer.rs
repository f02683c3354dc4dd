//! Assign structural paths to call-tree nodes and index them by path.
//!
//! Paths follow the same convention as the event-path deriver: a single
//! root is the empty path, the i-th root of a forest is `[i]`, and a node's
//! j-th child extends its parent's path with `j`.

use super::path::CallPath;
use crate::parser::call_tree::{CallNode, CallTree};
use log::debug;
use std::collections::HashMap;

/// Write each node's structural path into the tree
///
/// **Public** - must run before [`CallTreeIndex::build`]
pub fn assign_paths(tree: &mut CallTree) {
    fn assign(node: &mut CallNode, path: CallPath) {
        for (index, child) in node.calls.iter_mut().enumerate() {
            assign(child, path.child(index));
        }
        node.path = path;
    }

    match tree {
        CallTree::Single(root) => assign(root, CallPath::root()),
        CallTree::Forest(roots) => {
            for (index, root) in roots.iter_mut().enumerate() {
                assign(root, CallPath::root().child(index));
            }
        }
    }
}

/// Lookup from serialized path to call node
#[derive(Debug)]
pub struct CallTreeIndex<'a> {
    nodes: HashMap<String, &'a CallNode>,
}

impl<'a> CallTreeIndex<'a> {
    /// Index every node of a tree whose paths are already assigned
    pub fn build(tree: &'a CallTree) -> Self {
        fn visit<'a>(node: &'a CallNode, nodes: &mut HashMap<String, &'a CallNode>) {
            nodes.insert(node.path.key(), node);
            for child in &node.calls {
                visit(child, nodes);
            }
        }

        let mut nodes = HashMap::new();
        for root in tree.roots() {
            visit(root, &mut nodes);
        }

        debug!("Indexed {} call nodes", nodes.len());
        Self { nodes }
    }

    pub fn get(&self, path: &CallPath) -> Option<&'a CallNode> {
        self.nodes.get(&path.key()).copied()
    }

    pub fn contains(&self, path: &CallPath) -> bool {
        self.nodes.contains_key(&path.key())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
