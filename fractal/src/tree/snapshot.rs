//! Nested view of the thought tree for visualization.
//!
//! Trees can be as deep as `max_depth` allows, so nothing here recurses per
//! level: JSON conversion, node counting and drop all use explicit stacks.

use serde_json::{Map, Value};

use super::node::{NodeId, NodeStatus};

/// One node of the serialized tree with its children inlined.
///
/// Produced by [`NodeStore::snapshot`](super::NodeStore::snapshot); a pure read.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSnapshot {
    pub id: NodeId,
    pub content: String,
    pub score: f64,
    pub status: NodeStatus,
    pub children: Vec<TreeSnapshot>,
}

fn node_json(node: &TreeSnapshot, children: Vec<Value>) -> Value {
    let mut obj = Map::new();
    obj.insert("id".to_string(), Value::String(node.id.to_string()));
    obj.insert("content".to_string(), Value::String(node.content.clone()));
    obj.insert("score".to_string(), Value::from(node.score));
    obj.insert(
        "status".to_string(),
        Value::String(node.status.as_str().to_string()),
    );
    obj.insert("children".to_string(), Value::Array(children));
    Value::Object(obj)
}

impl TreeSnapshot {
    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// `{id, content, score, status, children}` JSON, built bottom-up.
    ///
    /// Status is lowercase (`pending`, `exploring`, `evaluated`, `pruned`).
    pub fn to_json(&self) -> Value {
        // Post-order: a node is emitted after all of its children, which then
        // sit in order at the tail of `done`.
        let mut stack: Vec<(&TreeSnapshot, bool)> = vec![(self, false)];
        let mut done: Vec<Value> = Vec::new();
        while let Some((node, children_done)) = stack.pop() {
            if !children_done {
                stack.push((node, true));
                stack.extend(node.children.iter().rev().map(|c| (c, false)));
                continue;
            }
            let children = done.split_off(done.len() - node.children.len());
            done.push(node_json(node, children));
        }
        done.pop().unwrap_or(Value::Null)
    }
}

impl Drop for TreeSnapshot {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}
