//! LLM abstraction layer

mod openrouter;

pub use openrouter::OpenRouterClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message in a chat-completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Errors from a chat-completion call
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key was configured for the provider
    #[error("OPENROUTER_API_KEY is not set. Please add it to your .env file.")]
    MissingApiKey,

    /// The provider answered with a non-success status
    #[error("{body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Connection failure, or a timeout while sending or reading the response
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// The response body was not a chat-completion payload
    #[error("failed to decode provider response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response carried no choices
    #[error("provider returned no choices")]
    EmptyResponse,

    /// Failed to build the HTTP client
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl LlmError {
    /// Whether this is a transport-level failure of the provider itself, as
    /// opposed to local misconfiguration or a malformed payload.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, LlmError::Status { .. } | LlmError::Transport(_))
    }
}

/// Trait for chat-completion backends
#[async_trait]
pub trait Llm: Send + Sync {
    /// Send the ordered messages and return the top choice's text
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// Get the model name
    fn model(&self) -> &str;
}

#[async_trait]
impl<T: Llm + ?Sized> Llm for Arc<T> {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        (**self).complete(messages).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::system("ctx")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "ctx"}));

        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_provider_error_classification() {
        let status = LlmError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        };
        assert!(status.is_provider_error());
        assert_eq!(status.to_string(), "upstream down");

        assert!(!LlmError::MissingApiKey.is_provider_error());
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!LlmError::Decode(decode).is_provider_error());
        assert!(!LlmError::EmptyResponse.is_provider_error());
    }
}
