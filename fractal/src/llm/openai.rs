//! OpenAI-compatible chat completions client (`POST {base_url}/chat/completions`).
//!
//! Works with any provider exposing the OpenAI chat API (Groq, OpenAI, local
//! gateways). Sampling settings are per client, so the explorer and critic are
//! two instances with different temperatures.
//!
//! **Interaction**: Implements [`LlmClient`]; depends on `async_openai`.

use std::fmt;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use super::{LlmClient, LlmError, LlmResponse, LlmUsage};
use crate::message::Message;

/// Default endpoint: Groq's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default model id.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

const API_KEY_VARS: [&str; 3] = ["FRACTAL_API_KEY", "GROQ_API_KEY", "OPENAI_API_KEY"];

/// API key whose `Debug`/`Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw secret, for the client config only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

fn to_llm_error(err: OpenAIError) -> LlmError {
    match err {
        OpenAIError::Reqwest(e) => LlmError::Transport(e.to_string()),
        OpenAIError::ApiError(e) => LlmError::Api {
            message: e.message,
            code: e.code,
        },
        e @ OpenAIError::JSONDeserialize(..) => LlmError::Decode(e.to_string()),
        other => LlmError::Other(other.to_string()),
    }
}

/// OpenAI-compatible chat client.
///
/// ```rust,no_run
/// use fractal::ChatOpenAI;
///
/// let explorer = ChatOpenAI::new("gsk-...", "llama-3.3-70b-versatile")
///     .with_temperature(0.8)
///     .with_max_tokens(500);
/// ```
#[derive(Clone)]
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    base_url: String,
    api_key: ApiKey,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl fmt::Debug for ChatOpenAI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatOpenAI")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ChatOpenAI {
    fn build_client(api_key: &ApiKey, base_url: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose())
            .with_api_base(base_url);
        Client::with_config(config)
    }

    /// Client for `model` against [`DEFAULT_BASE_URL`].
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let api_key = ApiKey::new(api_key);
        Self {
            client: Self::build_client(&api_key, DEFAULT_BASE_URL),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Reads `FRACTAL_API_KEY` (then `GROQ_API_KEY`, `OPENAI_API_KEY`),
    /// `FRACTAL_BASE_URL` and `FRACTAL_MODEL`.
    pub fn from_env() -> Result<Self, LlmError> {
        let key = API_KEY_VARS
            .iter()
            .find_map(|k| std::env::var(k).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| LlmError::MissingApiKey(API_KEY_VARS.join(" or ")))?;
        let model = std::env::var("FRACTAL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let mut client = Self::new(key, model);
        if let Ok(url) = std::env::var("FRACTAL_BASE_URL") {
            client = client.with_base_url(url);
        }
        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.client = Self::build_client(&self.api_key, &self.base_url);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chat completions URL, for logging.
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => ChatCompletionRequestMessage::Assistant(s.as_str().into()),
            })
            .collect()
    }

    fn build_request(&self, messages: &[Message]) -> Result<CreateChatCompletionRequest, LlmError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        if let Some(n) = self.max_tokens {
            args.max_completion_tokens(n);
        }
        args.build()
            .map_err(|e| LlmError::Transport(format!("request build failed: {}", e)))
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        let request = self.build_request(messages)?;
        tracing::debug!(
            url = %self.endpoint(),
            model = %self.model,
            messages = messages.len(),
            temperature = ?self.temperature,
            "chat completion request"
        );
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(to_llm_error)?;

        let usage = response.usage.map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;
        Ok(LlmResponse { content, usage })
    }
}
