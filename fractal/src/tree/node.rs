//! Thought node data model: [`NodeId`], [`NodeStatus`], [`ThoughtNode`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process-unique node identifier, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle of a thought node.
///
/// `Pending` → `Exploring` → `Evaluated`; a failed expansion goes back to
/// `Pending`. `Pruned` is terminal and only set by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Created, not expanded yet.
    #[default]
    Pending,
    /// Expansion in flight.
    Exploring,
    /// Expanded (children exist) and/or scored by the critic.
    Evaluated,
    /// Marked dead by a caller; never expanded, skipped by best-path selection.
    Pruned,
}

impl NodeStatus {
    /// Lowercase name as used in serialized trees.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Exploring => "exploring",
            NodeStatus::Evaluated => "evaluated",
            NodeStatus::Pruned => "pruned",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One thought in the reasoning tree.
///
/// Parent/child links are ids into the owning [`NodeStore`](super::NodeStore);
/// nodes never own each other. Values handed out by the store are clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtNode {
    pub id: NodeId,
    /// Sanitized text, at most 1000 characters.
    pub content: String,
    /// `None` only for the root.
    pub parent_id: Option<NodeId>,
    /// Child ids in creation order; written once by expansion.
    pub children: Vec<NodeId>,
    /// Distance from the root.
    pub depth: usize,
    /// Critic score in `[0.0, 1.0]`; meaningful once `Evaluated` or `Pruned`.
    pub score: f64,
    /// Set when the critic (or the neutral fallback) assigned `score`.
    #[serde(default)]
    pub scored: bool,
    pub status: NodeStatus,
    /// Caller annotations; not read by the engine.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ThoughtNode {
    pub(crate) fn root(content: String) -> Self {
        Self::build(content, None, 0)
    }

    pub(crate) fn child_of(parent_id: NodeId, parent_depth: usize, content: String) -> Self {
        Self::build(content, Some(parent_id), parent_depth + 1)
    }

    fn build(content: String, parent_id: Option<NodeId>, depth: usize) -> Self {
        Self {
            id: NodeId::new(),
            content,
            parent_id,
            children: Vec::new(),
            depth,
            score: 0.0,
            scored: false,
            status: NodeStatus::Pending,
            metadata: HashMap::new(),
        }
    }

    /// True for the single node without a parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True once expansion has attached children.
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}
