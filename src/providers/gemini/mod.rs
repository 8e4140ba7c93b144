use crate::core::error::GeoChatError;
use crate::providers::{LLMProvider, Message};
use async_trait::async_trait;

mod client;
mod types;

pub use client::GeminiClient;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self::with_endpoint(DEFAULT_BASE_URL.to_string(), api_key, model)
    }

    pub fn with_endpoint(endpoint: String, api_key: Option<String>, model: String) -> Self {
        let api_key = api_key.unwrap_or_default();
        Self {
            client: GeminiClient::new(endpoint, api_key, model),
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn get_response(&self, messages: &[Message]) -> Result<String, GeoChatError> {
        self.client.generate_content(messages).await
    }

    fn model(&self) -> &str {
        &self.client.model
    }
}
