//! Structural paths addressing call frames and call-tree nodes.
//!
//! A path is the sequence of child-call indices walked from the root.
//! The root is the empty path; its serialized key is the empty string and
//! deeper paths join their indices with `/` (e.g. `"0/2/1"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Child-index path from the root of a call tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallPath(Vec<usize>);

impl CallPath {
    /// The empty path (virtual root frame / single root node)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of this node's `index`-th child
    pub fn child(&self, index: usize) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialized map key: slash-joined indices, empty for the root
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parse a key produced by [`CallPath::key`]
    pub fn from_key(key: &str) -> Option<Self> {
        if key.is_empty() {
            return Some(Self::root());
        }
        key.split('/')
            .map(|part| part.parse::<usize>().ok())
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }
}

impl From<Vec<usize>> for CallPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for CallPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.key())
        }
    }
}

impl Serialize for CallPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for CallPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Self::from_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid call path: {key:?}")))
    }
}
