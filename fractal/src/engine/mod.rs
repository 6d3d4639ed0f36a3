//! Fractal engine: bounded, caller-driven tree-of-thought search.
//!
//! A step expands one node through the explorer (up to `branch_factor`
//! children) and scores every new child through the critic concurrently.
//! Callers repeat steps on promising children and read the greedy best path.
//!
//! Remote failures never surface as errors: a failed expansion leaves the node
//! `Pending`, a failed evaluation yields the configured neutral score.

mod evaluate;
mod expand;
mod path;
pub(crate) mod prompt;

pub use evaluate::parse_score;
pub use expand::{extract_json_array, parse_branches, ExpandOutcome, ParsedBranches};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::event::EngineEvent;
use crate::llm::LlmClient;
use crate::tree::{NodeId, NodeStatus, NodeStore, ThoughtNode, TreeSnapshot};

/// Tree-of-thought engine over one exclusively owned [`NodeStore`].
///
/// All operations take `&self`: tree bookkeeping is synchronous and never held
/// across a suspension point, so steps on disjoint subtrees may run
/// concurrently. Steps on overlapping subtrees must be serialized by the caller.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use fractal::{EngineConfig, FractalEngine, MockLlm};
///
/// # async fn demo() -> Result<(), fractal::EngineError> {
/// let explorer = Arc::new(MockLlm::with_reply(r#"["a", "b", "c"]"#));
/// let critic = Arc::new(MockLlm::with_reply("0.7"));
/// let engine = FractalEngine::new(explorer, critic, EngineConfig::default());
/// let root = engine.create_root("How do I keep my garden alive in a drought?")?;
/// engine.run_step(root.id).await?;
/// for node in engine.best_path() {
///     println!("{:.2} {}", node.score, node.content);
/// }
/// # Ok(())
/// # }
/// ```
pub struct FractalEngine {
    store: NodeStore,
    explorer: Arc<dyn LlmClient>,
    critic: Arc<dyn LlmClient>,
    config: EngineConfig,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl FractalEngine {
    /// Creates an engine with an empty tree and the given explorer/critic clients.
    pub fn new(
        explorer: Arc<dyn LlmClient>,
        critic: Arc<dyn LlmClient>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: NodeStore::new(),
            explorer,
            critic,
            config,
            events: None,
        }
    }

    /// Sends [`EngineEvent`]s to `tx` as the tree changes.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read access to the node arena.
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Creates the root from `query` (sanitized). Allowed once per engine.
    pub fn create_root(&self, query: &str) -> Result<ThoughtNode, EngineError> {
        let root = self.store.create_root(query)?;
        tracing::info!(
            node_id = %root.id,
            content_chars = root.content.chars().count(),
            "root node created"
        );
        self.emit(EngineEvent::RootCreated { id: root.id });
        Ok(root)
    }

    /// Copy of the node with `id`.
    pub fn get(&self, id: NodeId) -> Result<ThoughtNode, EngineError> {
        self.store.get(id)
    }

    pub fn root(&self) -> Option<ThoughtNode> {
        self.store.root()
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// One unit of search: expand `id`, then score every new child concurrently.
    ///
    /// Returns once all child evaluations have settled. Children of a node that
    /// was not expanded by this call (depth limit, already expanded, failure)
    /// are not evaluated.
    pub async fn run_step(&self, id: NodeId) -> Result<ExpandOutcome, EngineError> {
        let outcome = self.expand_node(id).await?;
        let children = outcome.children();
        if !children.is_empty() {
            let evaluations = children.iter().map(|child| self.evaluate_node(*child));
            for result in futures::future::join_all(evaluations).await {
                result?;
            }
        }
        Ok(outcome)
    }

    /// [`run_step`](Self::run_step) that stops as soon as `cancel` fires.
    ///
    /// Returns `Ok(None)` when cancelled. An abandoned expansion reverts its
    /// node to `Pending`; children already scored keep their score, the rest
    /// stay `Pending`.
    pub async fn run_step_with_cancel(
        &self,
        id: NodeId,
        cancel: &CancellationToken,
    ) -> Result<Option<ExpandOutcome>, EngineError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(node_id = %id, "step cancelled");
                Ok(None)
            }
            result = self.run_step(id) => result.map(Some),
        }
    }

    /// Marks `id` as pruned: never expanded again, skipped by best-path selection.
    pub fn prune(&self, id: NodeId) -> Result<(), EngineError> {
        self.store.update(id, |n| n.status = NodeStatus::Pruned)?;
        tracing::debug!(node_id = %id, "node pruned");
        self.emit(EngineEvent::Pruned { id });
        Ok(())
    }

    /// Stores a caller annotation on `id`.
    pub fn set_metadata(
        &self,
        id: NodeId,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), EngineError> {
        let key = key.into();
        self.store.update(id, |n| {
            n.metadata.insert(key, value);
        })
    }

    /// Nested view of the whole tree; `None` before the root exists.
    pub fn serialize(&self) -> Option<TreeSnapshot> {
        self.store.snapshot()
    }

    /// [`serialize`](Self::serialize) as JSON; `{}` before the root exists.
    pub fn to_json(&self) -> serde_json::Value {
        self.serialize()
            .map(|snap| snap.to_json())
            .unwrap_or_else(|| serde_json::json!({}))
    }
}
