use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::error::{ConverterError, Result};

/// Anything that can turn a system instruction plus a user payload into text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionClient {
    config: CompletionConfig,
    http: reqwest::Client,
}

impl ChatCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("scratch-converter/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(config, http))
    }

    /// Uses a caller-built HTTP client, e.g. one with custom proxy or TLS settings.
    pub fn with_http(config: CompletionConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        tracing::debug!(url = %self.url(), model = %self.config.model, "requesting completion");
        let response = self
            .http
            .post(self.url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ConverterError::Upstream(format!("HTTP {status}: {text}")));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ConverterError::Upstream(format!("malformed completion response: {e}")))?;

        reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ConverterError::Upstream("completion response has no choices".into()))?
            .message
            .content
            .ok_or_else(|| ConverterError::Upstream("first choice has no content".into()))
    }
}
