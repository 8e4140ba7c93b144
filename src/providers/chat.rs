use super::{LLMProvider, Message, Role};
use crate::core::error::GeoChatError;
use crate::gateway::ChatBackend;
use async_trait::async_trait;
use std::sync::Arc;

pub const SYSTEM_PROMPT_FOR_GEOSPATIAL: &str = "You are an advanced geospatial analysis assistant \
for ISRO (Indian Space Research Organisation). Your primary role is to answer geospatial questions \
about India.

For specific point-of-interest or direct location queries, give a direct, helpful answer from your \
general knowledge and name specific places or landmarks. For analytical or how-to queries, give a \
concise answer that explains the outcome or methodology of a GIS analysis.

Rules for every response:
- Focus on INDIA. If a location is ambiguous, assume it is in India.
- Do not use phrases like \"Based on my analysis\" or \"As an AI\". Provide the answer directly.
- Do not show step-by-step reasoning or numbered lists in the final answer.
- Never use coordinates or examples from outside India.

Reference knowledge for analytical queries: IRS, Cartosat, ResourceSat, RISAT, Oceansat and \
INSAT/GSAT imagery; QGIS, Bhuvan, VEDAS, NRSC Open Data Archive and MOSDAC; Census of India, Survey \
of India, India WRIS, NBSS&LUP soil maps, Forest Survey of India and IMD climate data.";

/// Answers chat queries with an LLM provider primed for Indian geospatial
/// questions. Each query is independent; no conversation history is sent.
pub struct LlmChatBackend {
    provider: Arc<dyn LLMProvider>,
}

impl LlmChatBackend {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    fn build_messages(query: &str) -> Vec<Message> {
        vec![
            Message {
                role: Role::System,
                content: SYSTEM_PROMPT_FOR_GEOSPATIAL.to_string(),
            },
            Message {
                role: Role::User,
                content: query.to_string(),
            },
        ]
    }
}

#[async_trait]
impl ChatBackend for LlmChatBackend {
    async fn chat(&self, query: &str) -> Result<String, GeoChatError> {
        tracing::info!(model = self.provider.model(), "sending query to model");
        let answer = self
            .provider
            .get_response(&Self::build_messages(query))
            .await?;
        tracing::info!(chars = answer.len(), "model answered");
        Ok(answer)
    }
}

/// Stands in for a provider that could not be built, e.g. for lack of an
/// API key. Slash commands keep working; chat turns report the reason.
pub struct UnconfiguredChatBackend {
    reason: String,
}

impl UnconfiguredChatBackend {
    pub fn new(reason: String) -> Self {
        Self { reason }
    }
}

#[async_trait]
impl ChatBackend for UnconfiguredChatBackend {
    async fn chat(&self, _query: &str) -> Result<String, GeoChatError> {
        Err(GeoChatError::Config(self.reason.clone()))
    }
}
