//! Evaluation: critic call and score parsing.

use super::prompt;
use super::FractalEngine;
use crate::error::EngineError;
use crate::event::EngineEvent;
use crate::tree::{NodeId, NodeStatus};

/// Parses a critic reply into a score in `[0.0, 1.0]`.
///
/// The trimmed reply must be a finite float; out-of-range values are clamped.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

impl FractalEngine {
    /// Scores `id` with the critic and marks it `Evaluated`.
    ///
    /// Never fails on critic trouble: an error, timeout, or non-numeric reply
    /// assigns `neutral_score`. Returns the assigned score.
    pub async fn evaluate_node(&self, id: NodeId) -> Result<f64, EngineError> {
        let node = self.store.get(id)?;
        let messages = prompt::critic_messages(&node.content, &self.config.critic_instruction);
        let reply = tokio::time::timeout(self.config.critic_timeout, self.critic.invoke(&messages))
            .await;

        let parsed = match reply {
            Ok(Ok(resp)) => {
                let score = parse_score(&resp.content);
                if score.is_none() {
                    tracing::warn!(node_id = %id, reply = %resp.content.trim(), "invalid score from critic");
                }
                score
            }
            Ok(Err(e)) => {
                tracing::error!(node_id = %id, error = %e, "critic call failed");
                None
            }
            Err(_) => {
                tracing::error!(
                    node_id = %id,
                    timeout_ms = self.config.critic_timeout.as_millis() as u64,
                    "critic call timed out"
                );
                None
            }
        };
        let fallback = parsed.is_none();
        let score = parsed.unwrap_or(self.config.neutral_score);

        self.store.update(id, |n| {
            n.score = score;
            n.scored = true;
            if n.status == NodeStatus::Pending {
                n.status = NodeStatus::Evaluated;
            }
        })?;
        tracing::debug!(node_id = %id, score, fallback, "node evaluated");
        self.emit(EngineEvent::Evaluated {
            id,
            score,
            fallback,
        });
        Ok(score)
    }
}
