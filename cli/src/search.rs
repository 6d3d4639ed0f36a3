//! One CLI search: build the engine, grow the tree, collect the result.

use std::sync::Arc;

use fractal::{
    CancellationToken, ChatOpenAI, ConfigError, EngineConfig, EngineError, ExpandOutcome,
    FractalEngine, LlmClient, LlmError, Message, MockLlm, NodeId, ThoughtNode,
    TreeSnapshot,
};
use thiserror::Error;
use tracing::Instrument;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("llm: {0}")]
    Llm(#[from] LlmError),
    #[error("engine: {0}")]
    Engine(#[from] EngineError),
    #[error("--steps must be at least 1")]
    NoSteps,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to search for and how far.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub query: String,
    /// Total steps: the root step plus best-leaf steps.
    pub steps: usize,
}

/// Outcome of [`run_search`].
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best_path: Vec<ThoughtNode>,
    pub tree: Option<TreeSnapshot>,
    /// Steps that created children.
    pub expansions: usize,
    pub nodes: usize,
    pub cancelled: bool,
}

impl SearchReport {
    /// Nested tree as JSON; `{}` when there is none.
    pub fn tree_json(&self) -> serde_json::Value {
        self.tree
            .as_ref()
            .map(TreeSnapshot::to_json)
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

/// Explorer and critic backed by the configured OpenAI-compatible endpoint.
pub fn remote_clients() -> Result<(Arc<dyn LlmClient>, Arc<dyn LlmClient>), CliError> {
    let base = ChatOpenAI::from_env()?;
    tracing::info!(model = %base.model(), "using remote llm");
    let explorer = base.clone().with_temperature(0.8).with_max_tokens(500);
    let critic = base.with_temperature(0.1).with_max_tokens(10);
    Ok((Arc::new(explorer), Arc::new(critic)))
}

fn thought_in(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| matches!(m, Message::User(_)))
        .map(|m| {
            m.content()
                .trim_start_matches("Thought:\n")
                .trim_matches('"')
                .to_string()
        })
        .unwrap_or_default()
}

/// Deterministic clients for running without network access.
///
/// The explorer proposes numbered refinements of the thought; the critic
/// prefers shorter thoughts.
pub fn offline_clients(branch_factor: usize) -> (Arc<dyn LlmClient>, Arc<dyn LlmClient>) {
    let explorer = MockLlm::with_responder(move |messages| {
        let thought = thought_in(messages);
        let branches: Vec<String> = (1..=branch_factor)
            .map(|i| format!("{} / option {}", thought, i))
            .collect();
        serde_json::to_string(&branches).map_err(|e| LlmError::Decode(e.to_string()))
    });
    let critic = MockLlm::with_responder(|messages| {
        let len = thought_in(messages).chars().count() as f64;
        Ok(format!("{:.3}", 1.0 / (1.0 + len / 100.0)))
    });
    (Arc::new(explorer), Arc::new(critic))
}

/// Steps the root, then the best leaf, until `steps` are used, the depth
/// limit is hit, or `cancel` fires.
pub async fn run_search(
    engine: &FractalEngine,
    opts: &SearchOptions,
    cancel: &CancellationToken,
) -> Result<SearchReport, CliError> {
    if opts.steps == 0 {
        return Err(CliError::NoSteps);
    }
    let root = engine.create_root(&opts.query)?;
    let span = tracing::info_span!("search", root_id = %root.id, steps = opts.steps);
    grow(engine, root.id, opts.steps, cancel)
        .instrument(span)
        .await
}

async fn grow(
    engine: &FractalEngine,
    root: NodeId,
    steps: usize,
    cancel: &CancellationToken,
) -> Result<SearchReport, CliError> {
    let mut expansions = 0;
    let mut cancelled = false;
    match engine.run_step_with_cancel(root, cancel).await? {
        None => cancelled = true,
        Some(ExpandOutcome::Expanded { .. }) => expansions += 1,
        Some(outcome) => tracing::warn!(?outcome, "root step created no children"),
    }

    if !cancelled && expansions > 0 && steps > 1 {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => cancelled = true,
            more = engine.explore_best(steps - 1) => expansions += more?,
        }
    }
    if cancelled {
        tracing::warn!("search cancelled, reporting partial tree");
    }

    Ok(SearchReport {
        best_path: engine.best_path(),
        tree: engine.serialize(),
        expansions,
        nodes: engine.len(),
        cancelled,
    })
}

/// Engine config from env plus command-line overrides, validated.
pub fn engine_config(
    max_depth: Option<usize>,
    branch_factor: Option<usize>,
    rubric: Option<String>,
) -> Result<EngineConfig, CliError> {
    let mut config = EngineConfig::from_env()?;
    if let Some(d) = max_depth {
        config = config.with_max_depth(d);
    }
    if let Some(b) = branch_factor {
        config = config.with_branch_factor(b);
    }
    if let Some(r) = rubric {
        config = config.with_critic_instruction(r);
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_engine(config: EngineConfig) -> FractalEngine {
        let (explorer, critic) = offline_clients(config.branch_factor);
        FractalEngine::new(explorer, critic, config)
    }

    fn opts(steps: usize) -> SearchOptions {
        SearchOptions {
            query: "plan irrigation".to_string(),
            steps,
        }
    }

    #[tokio::test]
    async fn offline_search_reaches_depth_limit() {
        let engine = offline_engine(EngineConfig::default().with_branch_factor(2));
        let report = run_search(&engine, &opts(10), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.expansions, 3);
        assert_eq!(report.best_path.len(), 4);
        assert_eq!(report.nodes, 7);
        assert!(!report.cancelled);
        assert_eq!(report.best_path[1].content, "plan irrigation / option 1");
    }

    #[tokio::test]
    async fn single_step_expands_root_only() {
        let engine = offline_engine(EngineConfig::default());
        let report = run_search(&engine, &opts(1), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.expansions, 1);
        assert_eq!(report.nodes, 4);
        assert_eq!(report.tree_json()["children"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn zero_steps_is_rejected() {
        let engine = offline_engine(EngineConfig::default());
        let err = run_search(&engine, &opts(0), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::NoSteps));
        assert!(engine.root().is_none());
    }

    #[tokio::test]
    async fn pre_cancelled_search_reports_bare_root() {
        let engine = offline_engine(EngineConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = run_search(&engine, &opts(3), &cancel).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.expansions, 0);
        assert_eq!(report.nodes, 1);
    }

    #[test]
    fn offline_critic_prefers_short_thoughts() {
        let (_, critic) = offline_clients(2);
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let score = |text: &str| {
            let messages = vec![
                Message::system("rubric"),
                Message::user(format!("Thought:\n\"\"\"{}\"\"\"", text)),
            ];
            let reply = rt.block_on(critic.invoke(&messages)).unwrap();
            fractal::parse_score(&reply.content).unwrap()
        };
        assert!(score("short") > score(&"long ".repeat(50)));
    }
}
