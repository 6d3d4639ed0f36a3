//! Expansion: explorer call, branch extraction, child creation.
//!
//! The explorer is asked for a JSON array of strings but may wrap it in prose,
//! so the array is located between the first `[` and the last `]`. When that
//! yields nothing usable, the whole response becomes a single branch.

use serde_json::Value;

use super::prompt;
use super::FractalEngine;
use crate::error::EngineError;
use crate::event::EngineEvent;
use crate::sanitize::sanitize;
use crate::tree::{NodeId, NodeStatus, NodeStore};

/// Result of [`FractalEngine::expand_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Children were created, in order.
    Expanded { children: Vec<NodeId> },
    /// Node is at `max_depth`; nothing happened.
    DepthLimit,
    /// Node already has children, is being explored, or is pruned.
    Skipped,
    /// Explorer failed, timed out, or returned nothing usable; node is `Pending` again.
    Failed,
}

impl ExpandOutcome {
    /// Ids created by this expansion (empty unless `Expanded`).
    pub fn children(&self) -> &[NodeId] {
        match self {
            ExpandOutcome::Expanded { children } => children,
            _ => &[],
        }
    }
}

/// Sanitized branch texts extracted from one explorer response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBranches {
    pub branches: Vec<String>,
    /// False when the raw-response fallback was used.
    pub from_array: bool,
}

/// Parses the slice between the first `[` and the last `]` as a JSON array.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Extracts at most `branch_factor` sanitized, non-blank branches from `raw`.
///
/// String elements are used as-is; other JSON values use their JSON text. An
/// array with no usable element falls back to the sanitized raw response. The
/// result is empty only when the raw response itself is blank after sanitizing.
pub fn parse_branches(raw: &str, branch_factor: usize) -> ParsedBranches {
    let branches: Vec<String> = extract_json_array(raw)
        .unwrap_or_default()
        .into_iter()
        .map(|v| match v {
            Value::String(s) => sanitize(&s),
            other => sanitize(&other.to_string()),
        })
        .filter(|s| !s.trim().is_empty())
        .take(branch_factor)
        .collect();
    if !branches.is_empty() {
        return ParsedBranches {
            branches,
            from_array: true,
        };
    }

    let whole = sanitize(raw);
    ParsedBranches {
        branches: if whole.trim().is_empty() {
            vec![]
        } else {
            vec![whole]
        },
        from_array: false,
    }
}

/// Puts an `Exploring` node back to `Pending` unless disarmed, so an abandoned
/// or failed expansion can be retried.
struct RevertOnDrop<'a> {
    store: &'a NodeStore,
    id: NodeId,
    armed: bool,
}

impl<'a> RevertOnDrop<'a> {
    fn new(store: &'a NodeStore, id: NodeId) -> Self {
        Self {
            store,
            id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RevertOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.store.update(self.id, |n| {
                if n.status == NodeStatus::Exploring {
                    n.status = NodeStatus::Pending;
                }
            });
        }
    }
}

impl FractalEngine {
    /// Expands `id` into up to `branch_factor` children via the explorer.
    ///
    /// A node at `max_depth` is left untouched ([`ExpandOutcome::DepthLimit`]).
    /// Explorer failures and timeouts are logged and reported as
    /// [`ExpandOutcome::Failed`]; the only error is an unknown id.
    pub async fn expand_node(&self, id: NodeId) -> Result<ExpandOutcome, EngineError> {
        // Check and claim under one entry lock so concurrent steps on the
        // same node expand it at most once.
        let max_depth = self.config.max_depth;
        let claim = self.store.update(id, |n| {
            if n.depth >= max_depth {
                Err(ExpandOutcome::DepthLimit)
            } else if n.is_expanded()
                || matches!(n.status, NodeStatus::Exploring | NodeStatus::Pruned)
            {
                Err(ExpandOutcome::Skipped)
            } else {
                n.status = NodeStatus::Exploring;
                Ok((n.content.clone(), n.depth))
            }
        })?;
        let (content, depth) = match claim {
            Ok(claimed) => claimed,
            Err(outcome) => {
                tracing::debug!(node_id = %id, ?outcome, "node not expandable");
                return Ok(outcome);
            }
        };
        let guard = RevertOnDrop::new(&self.store, id);
        tracing::debug!(node_id = %id, depth, "expanding node");

        let messages = prompt::explorer_messages(&content, self.config.branch_factor);
        let reply = tokio::time::timeout(
            self.config.explorer_timeout,
            self.explorer.invoke(&messages),
        )
        .await;
        let raw = match reply {
            Ok(Ok(resp)) => resp.content,
            Ok(Err(e)) => {
                tracing::error!(node_id = %id, error = %e, "explorer call failed");
                return Ok(self.expansion_failed(guard, e.to_string()));
            }
            Err(_) => {
                tracing::error!(
                    node_id = %id,
                    timeout_ms = self.config.explorer_timeout.as_millis() as u64,
                    "explorer call timed out"
                );
                return Ok(self.expansion_failed(guard, "explorer timed out".to_string()));
            }
        };

        let parsed = parse_branches(&raw, self.config.branch_factor);
        if parsed.branches.is_empty() {
            tracing::error!(node_id = %id, "explorer returned an empty response");
            return Ok(self.expansion_failed(guard, "empty explorer response".to_string()));
        }
        if !parsed.from_array {
            let preview: String = raw.chars().take(50).collect();
            tracing::warn!(node_id = %id, preview = %preview, "no JSON array in explorer output, using raw response");
        }

        let children = self.store.attach_children(id, &parsed.branches)?;
        self.store
            .update(id, |n| n.status = NodeStatus::Evaluated)?;
        guard.disarm();
        tracing::info!(node_id = %id, children = children.len(), "node expanded");
        self.emit(EngineEvent::Expanded {
            parent: id,
            children: children.clone(),
        });
        Ok(ExpandOutcome::Expanded { children })
    }

    fn expansion_failed(&self, guard: RevertOnDrop<'_>, reason: String) -> ExpandOutcome {
        let id = guard.id;
        drop(guard);
        self.emit(EngineEvent::ExpansionFailed { id, reason });
        ExpandOutcome::Failed
    }
}
