use super::{LLMProvider, Message, Role, provider_error};
use crate::core::error::GeoChatError;
use crate::providers::base_client::BaseApiClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatCompletionMessage>,
}

#[derive(Serialize)]
struct ChatCompletionMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Any provider speaking the OpenAI `chat/completions` protocol
/// (OpenAI itself, OpenRouter, DeepSeek).
#[derive(Clone)]
pub struct OpenAIStyleProvider {
    client: BaseApiClient,
    model: String,
}

impl OpenAIStyleProvider {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            client: BaseApiClient::new(base_url, api_key, extra_headers),
            model,
        }
    }

    fn build_payload(&self, messages: &[Message]) -> ChatCompletionRequest {
        let messages = messages
            .iter()
            .map(|m| ChatCompletionMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                },
                content: m.content.clone(),
            })
            .collect();

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
        }
    }
}

fn parse_completion(body: &str) -> Result<String, GeoChatError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GeoChatError::Transport(format!("Malformed completion response: {}", e)))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(GeoChatError::Backend(
            "The model returned an empty response. Please try rephrasing your question."
                .to_string(),
        ));
    }

    Ok(content)
}

#[async_trait]
impl LLMProvider for OpenAIStyleProvider {
    async fn get_response(&self, messages: &[Message]) -> Result<String, GeoChatError> {
        let payload = self.build_payload(messages);
        let response = self
            .client
            .send_request("chat/completions", &payload)
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        parse_completion(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_maps_roles() {
        let provider = OpenAIStyleProvider::new(
            "https://api.openai.com/v1".to_string(),
            None,
            "gpt-4.1-mini".to_string(),
            None,
        );
        let payload = provider.build_payload(&[
            Message {
                role: Role::System,
                content: "sys".to_string(),
            },
            Message {
                role: Role::User,
                content: "hi".to_string(),
            },
        ]);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model"], "gpt-4.1-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn completion_content_is_trimmed() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "  Use NDWI.\n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Use NDWI.");
    }

    #[test]
    fn empty_choices_is_backend_error() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, GeoChatError::Backend(_)));
    }
}
