use crate::config::{Provider, ProviderConfig};
use crate::core::error::GeoChatError;
use crate::providers::{LLMProvider, gemini::GeminiProvider, openai_style::OpenAIStyleProvider};
use std::collections::HashMap;
use std::sync::Arc;

type ProviderCreator =
    Box<dyn Fn(&ProviderConfig) -> Result<Arc<dyn LLMProvider>, GeoChatError> + Send + Sync>;

pub struct ProviderFactory {
    creators: HashMap<Provider, ProviderCreator>,
}

fn openai_style(
    provider: Provider,
    config: &ProviderConfig,
    extra_headers: Option<HashMap<String, String>>,
) -> Arc<dyn LLMProvider> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| provider.default_base_url().to_string());
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());
    Arc::new(OpenAIStyleProvider::new(
        base_url,
        config.resolve_api_key(provider),
        model,
        extra_headers,
    ))
}

fn create_openai(config: &ProviderConfig) -> Result<Arc<dyn LLMProvider>, GeoChatError> {
    Ok(openai_style(Provider::OpenAI, config, None))
}

fn create_openrouter(config: &ProviderConfig) -> Result<Arc<dyn LLMProvider>, GeoChatError> {
    let mut headers = HashMap::new();
    headers.insert(
        "HTTP-Referer".to_string(),
        "https://github.com/geochat/geochat".to_string(),
    );
    headers.insert("X-Title".to_string(), "geochat".to_string());
    Ok(openai_style(Provider::OpenRouter, config, Some(headers)))
}

fn create_deepseek(config: &ProviderConfig) -> Result<Arc<dyn LLMProvider>, GeoChatError> {
    Ok(openai_style(Provider::DeepSeek, config, None))
}

fn create_gemini(config: &ProviderConfig) -> Result<Arc<dyn LLMProvider>, GeoChatError> {
    let api_key = config.resolve_api_key(Provider::Gemini).ok_or_else(|| {
        GeoChatError::Config(format!(
            "No Gemini API key found. Set providers.gemini.api_key or {}",
            Provider::Gemini.api_key_env()
        ))
    })?;
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| Provider::Gemini.default_model().to_string());
    let provider = match &config.base_url {
        Some(base_url) => GeminiProvider::with_endpoint(base_url.clone(), Some(api_key), model),
        None => GeminiProvider::new(Some(api_key), model),
    };
    Ok(Arc::new(provider))
}

impl ProviderFactory {
    pub fn new() -> Self {
        let mut creators: HashMap<Provider, ProviderCreator> = HashMap::new();

        creators.insert(Provider::OpenAI, Box::new(create_openai));
        creators.insert(Provider::OpenRouter, Box::new(create_openrouter));
        creators.insert(Provider::DeepSeek, Box::new(create_deepseek));
        creators.insert(Provider::Gemini, Box::new(create_gemini));

        Self { creators }
    }

    pub fn create(
        &self,
        provider: &Provider,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn LLMProvider>, GeoChatError> {
        self.creators
            .get(provider)
            .ok_or_else(|| GeoChatError::Config(format!("Provider not found: {:?}", provider)))
            .and_then(|creator| creator(config))
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_override_is_used() {
        let config = ProviderConfig {
            api_key: Some("k".to_string()),
            base_url: None,
            model: Some("gpt-4o".to_string()),
        };
        let provider = ProviderFactory::new()
            .create(&Provider::OpenAI, &config)
            .unwrap();
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let config = ProviderConfig {
            api_key: Some("k".to_string()),
            ..ProviderConfig::default()
        };
        let provider = ProviderFactory::new()
            .create(&Provider::Gemini, &config)
            .unwrap();
        assert_eq!(provider.model(), "gemini-2.0-flash");
    }
}
