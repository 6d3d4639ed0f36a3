//! LLM client abstraction for the explorer and critic services.
//!
//! The engine treats both services as opaque request/response calls: messages
//! in, free-form text out. This module defines the trait, the error type, a
//! scriptable mock, and an OpenAI-compatible HTTP client.

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::{ApiKey, ChatOpenAI, DEFAULT_BASE_URL, DEFAULT_MODEL};

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

/// Errors from an [`LlmClient`] call.
///
/// The engine never propagates these: a failed explorer call leaves the node
/// unexpanded, a failed critic call yields the neutral score.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// No API key in the environment.
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
    /// Connection, TLS, or request-building failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Error object returned by the provider (bad key, unknown model, quota).
    #[error("API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
    },
    /// Body was not a chat completion.
    #[error("decode error: {0}")]
    Decode(String),
    /// Completion without any choice or content.
    #[error("response contained no message content")]
    EmptyResponse,
    /// Any other failure (used by test doubles).
    #[error("{0}")]
    Other(String),
}

/// Token usage for one call, when the provider reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    /// Response with content only.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// LLM client: given messages, returns assistant text.
///
/// Implementations: [`MockLlm`] (scripted replies), [`ChatOpenAI`]
/// (OpenAI-compatible chat completions).
///
/// **Interaction**: Injected into [`FractalEngine`](crate::FractalEngine) twice,
/// once as explorer and once as critic.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one completion.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct StubLlm {
        content: String,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(&self, _messages: &[Message]) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse::text(self.content.clone()))
        }
    }

    #[tokio::test]
    async fn trait_object_invoke_returns_content() {
        let llm: Arc<dyn LlmClient> = Arc::new(StubLlm {
            content: "hello".to_string(),
        });
        let resp = llm.invoke(&[Message::user("hi")]).await.unwrap();
        assert_eq!(resp.content, "hello");
        assert!(resp.usage.is_none());
    }

    #[test]
    fn api_error_display() {
        let err = LlmError::Api {
            message: "rate limited".into(),
            code: Some("rate_limit_exceeded".into()),
        };
        assert_eq!(err.to_string(), "API error: rate limited");
    }
}
