//! Errors surfaced by the fractal engine.
//!
//! Remote-service failures (explorer/critic) never appear here: the engine
//! recovers from them locally. Callers only see misuse of the engine API.

use thiserror::Error;

use crate::tree::NodeId;

/// Errors returned by [`FractalEngine`](crate::FractalEngine) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Root creation with text that is empty or whitespace-only after sanitization.
    #[error("root query is empty after sanitization")]
    EmptyInput,
    /// Root creation called on an engine that already has a root.
    #[error("engine already has a root node")]
    AlreadyInitialized,
    /// Operation referenced a node id that is not in the store.
    #[error("node not found: {0}")]
    NotFound(NodeId),
}
