use crate::core::error::GeoChatError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GIS_URL: &str = "http://127.0.0.1:5000";
pub const GIS_URL_ENV: &str = "GEOCHAT_GIS_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    OpenRouter,
    DeepSeek,
    Gemini,
}

impl Provider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "openrouter" => Some(Provider::OpenRouter),
            "deepseek" => Some(Provider::DeepSeek),
            "gemini" => Some(Provider::Gemini),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4.1-mini",
            Provider::OpenRouter => "google/gemini-2.0-flash-001",
            Provider::DeepSeek => "deepseek-chat",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }

    /// Environment variable consulted when the config file has no key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
            Provider::Gemini => "GOOGLE_API_KEY",
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::Gemini
    }
}

/// Where free-text questions are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatBackendKind {
    /// Call the configured LLM provider directly
    #[default]
    Provider,
    /// Post to the GIS server's `/api/chat`
    GisServer,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl ProviderConfig {
    /// Config-file key first, then the provider's environment variable.
    pub fn resolve_api_key(&self, provider: Provider) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(provider.api_key_env()).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GisConfig {
    pub base_url: Option<String>,
}

fn default_zoom() -> u8 {
    12
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    pub active_provider: Option<Provider>,
    #[serde(default)]
    pub chat_backend: ChatBackendKind,
    #[serde(default)]
    pub providers: HashMap<Provider, ProviderConfig>,
    #[serde(default)]
    pub gis: GisConfig,
    #[serde(default)]
    pub map: MapConfig,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".geochat")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn history_path() -> PathBuf {
        Self::config_dir().join("input_history.txt")
    }

    pub fn load() -> Result<Config, GeoChatError> {
        Self::load_from(&Self::config_path())
    }

    /// Reads the config at `path`, writing a default one first if it is missing.
    pub fn load_from(path: &Path) -> Result<Config, GeoChatError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config = serde_yml::from_str::<Config>(&contents)
                .map_err(|e| GeoChatError::Config(format!("Parse {}: {}", path.display(), e)))?;
            return Ok(config);
        }

        let config = Config::default();
        if let Err(e) = config.save_to(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default config");
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), GeoChatError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(self)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }

    /// CLI flag, then the config file, then `GEOCHAT_GIS_URL`, then the default.
    pub fn gis_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| self.gis.base_url.clone())
            .or_else(|| std::env::var(GIS_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_GIS_URL.to_string())
    }

    pub fn provider_config(&self, provider: Provider) -> ProviderConfig {
        self.providers.get(&provider).cloned().unwrap_or_default()
    }
}
