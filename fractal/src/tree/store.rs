//! In-memory node arena: id → node map plus the root id.
//!
//! Nodes reference each other by [`NodeId`]. Mutation is synchronous; no
//! guard is ever held across an `.await`, and no guard is held while touching
//! another entry (two guards on one shard would deadlock).

use std::collections::HashMap;
use std::sync::OnceLock;

use dashmap::DashMap;

use crate::error::EngineError;
use crate::sanitize::sanitize;

use super::node::{NodeId, NodeStatus, ThoughtNode};
use super::snapshot::TreeSnapshot;

/// Arena of thought nodes forming one rooted tree.
///
/// **Interaction**: Owned by exactly one [`FractalEngine`](crate::FractalEngine);
/// reads are public, writes go through the engine.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: DashMap<NodeId, ThoughtNode>,
    root: OnceLock<NodeId>,
}

impl NodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the depth-0 node from a sanitized `query`.
    ///
    /// Fails with [`EngineError::AlreadyInitialized`] if a root exists and with
    /// [`EngineError::EmptyInput`] if nothing but whitespace survives sanitizing.
    pub fn create_root(&self, query: &str) -> Result<ThoughtNode, EngineError> {
        if self.root.get().is_some() {
            return Err(EngineError::AlreadyInitialized);
        }
        let content = sanitize(query);
        if content.trim().is_empty() {
            return Err(EngineError::EmptyInput);
        }
        let root = ThoughtNode::root(content);
        self.root
            .set(root.id)
            .map_err(|_| EngineError::AlreadyInitialized)?;
        self.nodes.insert(root.id, root.clone());
        Ok(root)
    }

    /// Returns a copy of the node with `id`.
    pub fn get(&self, id: NodeId) -> Result<ThoughtNode, EngineError> {
        self.nodes
            .get(&id)
            .map(|n| n.clone())
            .ok_or(EngineError::NotFound(id))
    }

    /// True if `id` is in the store.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Id of the root, once created.
    pub fn root_id(&self) -> Option<NodeId> {
        self.root.get().copied()
    }

    /// Copy of the root, once created.
    pub fn root(&self) -> Option<ThoughtNode> {
        self.root_id().and_then(|id| self.get(id).ok())
    }

    /// Child ids of `id` in creation order.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, EngineError> {
        self.nodes
            .get(&id)
            .map(|n| n.children.clone())
            .ok_or(EngineError::NotFound(id))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True before the root is created.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs `f` on the node with `id` under its entry lock.
    pub(crate) fn update<R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&mut ThoughtNode) -> R,
    ) -> Result<R, EngineError> {
        let mut entry = self.nodes.get_mut(&id).ok_or(EngineError::NotFound(id))?;
        Ok(f(&mut entry))
    }

    /// Sanitizes each text into a child of `parent`, registers the children and
    /// records them on the parent in order. Returns the new ids.
    ///
    /// A parent that already has children is left untouched and gets an empty
    /// result: children are written exactly once.
    pub(crate) fn attach_children(
        &self,
        parent: NodeId,
        texts: &[String],
    ) -> Result<Vec<NodeId>, EngineError> {
        let (depth, expanded) = {
            let p = self.nodes.get(&parent).ok_or(EngineError::NotFound(parent))?;
            (p.depth, p.is_expanded())
        };
        if expanded {
            return Ok(Vec::new());
        }
        let children: Vec<ThoughtNode> = texts
            .iter()
            .map(|t| ThoughtNode::child_of(parent, depth, sanitize(t)))
            .collect();
        let ids: Vec<NodeId> = children.iter().map(|c| c.id).collect();
        for child in children {
            self.nodes.insert(child.id, child);
        }
        self.update(parent, |p| p.children.extend(ids.iter().copied()))?;
        Ok(ids)
    }

    /// Builds the nested view of the tree without recursing over the node graph.
    ///
    /// Nodes are collected in pre-order with an explicit stack, then assembled
    /// bottom-up so every child snapshot exists before its parent is built.
    pub fn snapshot(&self) -> Option<TreeSnapshot> {
        let root = self.root_id()?;
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }

        let mut built: HashMap<NodeId, TreeSnapshot> = HashMap::with_capacity(order.len());
        for id in order.into_iter().rev() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let children = node
                .children
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(
                id,
                TreeSnapshot {
                    id,
                    content: node.content.clone(),
                    score: node.score,
                    status: node.status,
                    children,
                },
            );
        }
        built.remove(&root)
    }

    /// Status of `id`, if present.
    pub fn status(&self, id: NodeId) -> Option<NodeStatus> {
        self.nodes.get(&id).map(|n| n.status)
    }
}
