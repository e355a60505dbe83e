//! Client for the external structured-generation service.
//!
//! Wraps an OpenAI-compatible `/chat/completions` endpoint using
//! [`reqwest`], asking for a JSON object response. The returned text is NOT
//! trusted: callers pass it through the schema validator before use.
//!
//! One client is built at process start and shared by every handler that
//! needs it; the underlying `reqwest::Client` pools connections.

use async_trait::async_trait;
use serde::Deserialize;

/// Default endpoint base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the generation service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    /// When `None`, every generation request fails with
    /// [`LlmError::NotConfigured`].
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl LlmConfig {
    /// Load from environment variables with defaults.
    ///
    /// | Env Var       | Default                     |
    /// |---------------|-----------------------------|
    /// | `LLM_API_URL` | `https://api.openai.com/v1` |
    /// | `LLM_API_KEY` | unset                       |
    /// | `LLM_MODEL`   | `gpt-4o-mini`               |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("LLM_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_key: std::env::var("LLM_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: std::env::var("LLM_MODEL").unwrap_or(defaults.model),
        }
    }
}

/// Errors from the generation client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Generation API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A 2xx response carried no message content.
    #[error("Generation API returned no content")]
    EmptyResponse,

    #[error("No API key configured for the generation service")]
    NotConfigured,
}

/// Anything that can turn a prompt into raw structured text.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Generate a JSON document. `instructions` describe the expected shape.
    async fn generate(&self, instructions: &str, prompt: &str) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl StructuredGenerator for OpenAiGenerator {
    async fn generate(&self, instructions: &str, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.config.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": instructions },
                { "role": "user", "content": prompt },
            ],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {e}>"));
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
