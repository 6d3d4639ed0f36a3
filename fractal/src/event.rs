//! Engine events for live visualization of a growing tree.

use serde::Serialize;

use crate::tree::NodeId;

/// Emitted by [`FractalEngine`](crate::FractalEngine) on an unbounded channel
/// set with [`with_events`](crate::FractalEngine::with_events). Sending never
/// blocks; a closed receiver is ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    RootCreated { id: NodeId },
    Expanded { parent: NodeId, children: Vec<NodeId> },
    ExpansionFailed { id: NodeId, reason: String },
    /// `fallback` is true when the neutral score was used.
    Evaluated { id: NodeId, score: f64, fallback: bool },
    Pruned { id: NodeId },
}
