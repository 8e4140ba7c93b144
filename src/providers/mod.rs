pub mod base_client;
pub mod chat;
pub mod factory;
pub mod gemini;
pub mod openai_style;

use crate::core::error::GeoChatError;
use async_trait::async_trait;
use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// A prompt message sent to a model. Distinct from the session transcript.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn get_response(&self, messages: &[Message]) -> Result<String, GeoChatError>;

    fn model(&self) -> &str;
}

/// Turns a non-success provider reply into a backend error, preferring the
/// provider's own `error.message` over the bare status line.
pub(crate) fn provider_error(status: StatusCode, body: &str) -> GeoChatError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| format!("Provider returned {}", status));
    GeoChatError::Backend(message)
}
