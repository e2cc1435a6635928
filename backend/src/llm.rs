//! Outbound prompt proxy to an OpenAI-compatible chat completions API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Default chat completions endpoint (Groq).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model used for completions.
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

/// Settings for the prompt proxy.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Bearer token for the upstream API. Prompts fail fast when unset.
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Errors from the prompt proxy.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("GROQ API key not configured")]
    MissingApiKey,

    #[error("GROQ API error: {status} {reason}")]
    Upstream { status: u16, reason: String },

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

/// Generated text plus provider usage metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Value>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl From<ChatResponse> for Completion {
    fn from(response: ChatResponse) -> Self {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        Self {
            text,
            usage: response.usage,
        }
    }
}

/// HTTP client for the upstream text generation API.
#[derive(Debug, Clone)]
pub struct PromptClient {
    config: PromptConfig,
    client: Client,
}

impl PromptClient {
    pub fn new(config: PromptConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Send a single-turn user prompt and return the first choice.
    pub async fn complete(&self, prompt: &str) -> Result<Completion, PromptError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(PromptError::MissingApiKey)?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!("Sending prompt to {} (model {})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&ChatRequest {
                model: &self.config.model,
                messages: [ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Prompt upstream returned {}", status);
            return Err(PromptError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.into())
    }
}
