//! LLM client for anomaly explanations
//!
//! This module provides a small client for OpenAI-compatible chat completion
//! endpoints, plus the credential resolution rules used to decide whether a
//! live model is available at all.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::utils::error::ExplainError;
use crate::utils::truncate_text;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Placeholder shipped in env templates; treated as no key
const API_KEY_PLACEHOLDER: &str = "YOUR_OPENAI_API_KEY_HERE";

/// Configuration for LLM client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (default: https://api.openai.com)
    pub endpoint: String,

    /// Model name to use (default: gpt-4o-mini)
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            max_tokens: 100,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub(crate) fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("OPENAI_BASE_URL") {
            self.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.model = model;
        }
        if let Some(timeout) = std::env::var("OPENAI_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.timeout_secs = timeout;
        }
        if let Some(max_tokens) = std::env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = std::env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.temperature = temperature;
        }
    }
}

/// API key for the explanation provider
///
/// The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, rejecting blanks and the template placeholder
    pub fn new(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// Resolve a credential: explicit input first, then the fallback value
    pub fn resolve(explicit: Option<&str>, fallback: Option<&str>) -> Option<Self> {
        explicit
            .and_then(Self::new)
            .or_else(|| fallback.and_then(Self::new))
    }

    /// Resolve from explicit input, falling back to `OPENAI_API_KEY`
    pub fn from_input_or_env(explicit: Option<&str>) -> Option<Self> {
        let env = std::env::var(API_KEY_ENV).ok();
        Self::resolve(explicit, env.as_deref())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// LLM client for chat completions
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    credential: Credential,
}

impl LlmClient {
    /// Create a new LLM client with custom config
    ///
    /// # Errors
    ///
    /// Returns `ExplainError::ProviderUnavailable` if the HTTP client cannot be built
    pub fn with_config(config: LlmConfig, credential: Credential) -> Result<Self, ExplainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ExplainError::ProviderUnavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            credential,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Generate a completion for a single user prompt
    pub async fn complete(&self, prompt: &str) -> Result<String, ExplainError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = format!("{status} - {}", truncate_text(body.trim(), 200));
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ExplainError::ProviderUnavailable(detail)
                }
                _ => ExplainError::GenerationFailed(detail),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExplainError::GenerationFailed(format!("Invalid response: {e}")))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ExplainError::GenerationFailed("No response generated".to_string()))
    }
}
