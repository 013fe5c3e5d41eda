//! OpenRouter (OpenAI-compatible) chat-completion client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{Llm, LlmError, Message};
use crate::config::LlmSection;

/// Chat-completion request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

/// Chat-completion response body (only the fields we read)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenRouterClient {
    http_client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouterClient {
    /// Create a client from the LLM config section.
    ///
    /// A missing API key is not an error here; it is reported on each call.
    pub fn new(config: &LlmSection) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(LlmError::Client)?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    /// Whether an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Llm for OpenRouterClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let mut builder = self
            .http_client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&request);

        // Optional OpenRouter attribution headers
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        tracing::debug!(model = %self.model, messages = messages.len(), "Calling chat completion");

        let response = builder.send().await.map_err(LlmError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Provider returned an error");
            return Err(LlmError::Status { status, body });
        }

        // The client timeout also covers the body, so a stalled read is a transport failure
        let bytes = response.bytes().await.map_err(LlmError::Transport)?;
        let response: ChatResponse = serde_json::from_slice(&bytes).map_err(LlmError::Decode)?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
