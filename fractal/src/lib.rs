//! # Fractal
//!
//! Bounded tree-of-thought reasoning over two injected LLM services: an
//! **explorer** that proposes divergent follow-up thoughts and a **critic** that
//! scores each thought in `[0.0, 1.0]`.
//!
//! ## Design principles
//!
//! - **Caller-driven depth**: one [`FractalEngine::run_step`] expands one node and
//!   scores its children; the engine never recurses on its own. `max_depth` and
//!   `branch_factor` bound the tree.
//! - **Flat arena**: nodes live in a [`NodeStore`] keyed by [`NodeId`]; parent and
//!   children are ids, never owned subtrees.
//! - **Graceful degradation**: explorer/critic failures, timeouts, and malformed
//!   replies are logged and absorbed. Callers only see [`EngineError`].
//! - **Sanitized content**: every thought passes through [`sanitize`] before it
//!   is stored, so it cannot break out of the prompt delimiters.
//!
//! ## Main modules
//!
//! - [`engine`]: [`FractalEngine`], [`ExpandOutcome`], branch/score parsing.
//! - [`tree`]: [`NodeStore`], [`ThoughtNode`], [`NodeStatus`], [`TreeSnapshot`].
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatOpenAI`].
//! - [`config`]: [`EngineConfig`], [`TieBreak`].
//! - [`event`]: [`EngineEvent`] for live visualization.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fractal::{ChatOpenAI, EngineConfig, FractalEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let base = ChatOpenAI::from_env()?;
//! let explorer = Arc::new(base.clone().with_temperature(0.8).with_max_tokens(500));
//! let critic = Arc::new(base.with_temperature(0.1).with_max_tokens(10));
//! let engine = FractalEngine::new(explorer, critic, EngineConfig::from_env()?);
//!
//! let root = engine.create_root("Should we irrigate before the heat wave?")?;
//! engine.run_step(root.id).await?;
//! engine.explore_best(2).await?;
//! println!("{}", serde_json::to_string_pretty(&engine.to_json())?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod llm;
pub mod message;
pub mod sanitize;
pub mod tree;

pub use config::{ConfigError, EngineConfig, TieBreak};
pub use engine::{
    extract_json_array, parse_branches, parse_score, ExpandOutcome, FractalEngine, ParsedBranches,
};
pub use error::EngineError;
pub use event::EngineEvent;
pub use llm::{ApiKey, ChatOpenAI, LlmClient, LlmError, LlmResponse, LlmUsage, MockLlm};
pub use message::Message;
pub use sanitize::{sanitize, MAX_CONTENT_CHARS};
pub use tree::{NodeId, NodeStatus, NodeStore, ThoughtNode, TreeSnapshot};

pub use tokio_util::sync::CancellationToken;
