use crate::core::error::GeoChatError;
use crate::providers::base_client::BaseApiClient;
use crate::providers::gemini::types::*;
use crate::providers::{Message, Role, provider_error};

#[derive(Clone)]
pub struct GeminiClient {
    pub model: String,
    client: BaseApiClient,
}

impl GeminiClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let mut client = BaseApiClient::new(base_url, None, None);

        // Gemini authenticates with a query parameter, not a bearer token
        client.add_query_param("key", api_key);

        Self { client, model }
    }

    pub async fn generate_content(&self, messages: &[Message]) -> Result<String, GeoChatError> {
        let payload = build_payload(messages);
        let response = self
            .client
            .send_request(
                &format!("v1beta/models/{}:generateContent", self.model),
                &payload,
            )
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            GeoChatError::Transport(format!("Failed to parse Gemini response: {}", e))
        })?;

        extract_text(parsed)
    }
}

pub(crate) fn build_payload(messages: &[Message]) -> GeminiRequest {
    let mut contents = Vec::new();
    let mut system_instruction = None;

    for message in messages {
        let role = match message.role {
            Role::System => {
                if system_instruction.is_none() {
                    system_instruction = Some(SystemInstruction {
                        parts: vec![GeminiPart {
                            text: message.content.clone(),
                        }],
                    });
                }
                continue;
            }
            Role::User => "user",
        };

        contents.push(GeminiContentPart {
            role: role.to_string(),
            parts: vec![GeminiPart {
                text: message.content.clone(),
            }],
        });
    }

    GeminiRequest {
        contents,
        system_instruction,
    }
}

pub(crate) fn extract_text(response: GeminiResponse) -> Result<String, GeoChatError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        tracing::error!(%reason, "prompt blocked by Gemini safety filter");
        return Err(GeoChatError::Backend(format!(
            "Your query was blocked by the content safety filter. Reason: {}. Please rephrase your question.",
            reason
        )));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        GeoChatError::Backend(
            "Received an invalid response from the AI model (no candidates).".to_string(),
        )
    })?;

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(GeoChatError::Backend(format!(
            "The model could not generate a response. Reason: {}.",
            reason
        )));
    }

    Ok(text)
}
