//! Greedy best-path extraction and best-leaf iteration.

use super::{ExpandOutcome, FractalEngine};
use crate::config::TieBreak;
use crate::error::EngineError;
use crate::tree::{NodeStatus, ThoughtNode};

impl FractalEngine {
    /// Root-to-leaf path that always descends into the highest-scored child.
    ///
    /// Greedy: alternatives are never revisited once a child is chosen. Only
    /// scored, unpruned children compete; the walk stops at a node without
    /// such children, so a partially stepped tree yields a shorter path.
    /// Empty when there is no root.
    pub fn best_path(&self) -> Vec<ThoughtNode> {
        let mut path = Vec::new();
        let mut current = self.store.root();
        while let Some(node) = current {
            current = self.best_child(&node);
            path.push(node);
        }
        path
    }

    fn best_child(&self, node: &ThoughtNode) -> Option<ThoughtNode> {
        let mut best: Option<ThoughtNode> = None;
        for id in &node.children {
            let Ok(child) = self.store.get(*id) else {
                continue;
            };
            if !child.scored || child.status == NodeStatus::Pruned {
                continue;
            }
            let replace = match &best {
                None => true,
                Some(b) => match self.config.tie_break {
                    TieBreak::FirstCreated => child.score > b.score,
                    TieBreak::LastCreated => child.score >= b.score,
                },
            };
            if replace {
                best = Some(child);
            }
        }
        best
    }

    /// Runs up to `steps` steps, each on the current best-path leaf.
    ///
    /// Stops early when the leaf is at `max_depth` or a step creates no
    /// children. Returns the number of steps that expanded a node; `0` without
    /// a root.
    pub async fn explore_best(&self, steps: usize) -> Result<usize, EngineError> {
        let mut expanded = 0;
        for _ in 0..steps {
            let Some(leaf) = self.best_path().pop() else {
                break;
            };
            if leaf.depth >= self.config.max_depth {
                break;
            }
            match self.run_step(leaf.id).await? {
                ExpandOutcome::Expanded { .. } => expanded += 1,
                outcome => {
                    tracing::debug!(node_id = %leaf.id, ?outcome, "best-leaf exploration stopped");
                    break;
                }
            }
        }
        Ok(expanded)
    }
}
