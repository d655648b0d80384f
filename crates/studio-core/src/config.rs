//! LLM provider settings and browser options consulted when a task is launched.

use crate::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const MAX_TEMPERATURE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenRouter,
    OpenAi,
    Anthropic,
    Groq,
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenRouter,
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Groq,
        Provider::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openrouter",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Groq => "groq",
            Provider::Ollama => "ollama",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OpenRouter",
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Groq => "Groq",
            Provider::Ollama => "Ollama (Local)",
        }
    }

    /// Candidate models, first entry is the provider's default
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenRouter => &[
                "openai/gpt-4o",
                "anthropic/claude-3-opus",
                "google/gemini-pro",
                "meta-llama/llama-3-70b",
            ],
            Provider::OpenAi => &["gpt-4", "gpt-4-turbo", "gpt-3.5-turbo"],
            Provider::Anthropic => &["claude-3-opus", "claude-3-sonnet", "claude-3-haiku"],
            Provider::Groq => &["llama3-70b", "mixtral-8x7b"],
            Provider::Ollama => &["llama3", "mistral", "phi3"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0]
    }

    pub fn offers(&self, model: &str) -> bool {
        self.models().contains(&model)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Provider::ALL
            .iter()
            .find(|p| p.as_str() == needle)
            .copied()
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallingMethod {
    #[default]
    Auto,
    Sequential,
    Parallel,
}

impl FromStr for ToolCallingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ToolCallingMethod::Auto),
            "sequential" => Ok(ToolCallingMethod::Sequential),
            "parallel" => Ok(ToolCallingMethod::Parallel),
            other => Err(Error::InvalidValue(format!(
                "unknown tool calling method '{}'",
                other
            ))),
        }
    }
}

fn redact<S: Serializer>(secret: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if secret.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("********")
    }
}

/// Connection and agent-loop settings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    provider: Provider,
    model: String,
    #[serde(serialize_with = "redact")]
    api_key: String,
    pub base_url: String,
    temperature: f64,
    pub max_steps: u32,
    pub max_actions_per_step: u32,
    pub use_vision: bool,
    pub enable_screenshot: bool,
    pub tool_calling_method: ToolCallingMethod,
    pub advanced: AdvancedSettings,
    pub integrations: Integrations,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenRouter,
            model: Provider::OpenRouter.default_model().to_string(),
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_steps: 100,
            max_actions_per_step: 10,
            use_vision: true,
            enable_screenshot: true,
            tool_calling_method: ToolCallingMethod::Auto,
            advanced: AdvancedSettings::default(),
            integrations: Integrations::default(),
        }
    }
}

impl BrowserConfig {
    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Switch provider and reset the model to the provider's first entry
    pub fn set_provider(&mut self, provider: Provider) {
        if provider != self.provider {
            tracing::debug!(
                "Provider {} -> {}, model reset to {}",
                self.provider,
                provider,
                provider.default_model()
            );
        }
        self.provider = provider;
        self.model = provider.default_model().to_string();
    }

    pub fn set_model(&mut self, model: &str) -> Result<()> {
        if !self.provider.offers(model) {
            return Err(Error::ModelNotOffered {
                provider: self.provider.to_string(),
                model: model.to_string(),
            });
        }
        self.model = model.to_string();
        Ok(())
    }

    pub fn set_api_key(&mut self, key: &str) {
        self.api_key = key.to_string();
    }

    /// Store a temperature clamped to [0, 2]; NaN falls back to the default
    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = if temperature.is_nan() {
            DEFAULT_TEMPERATURE
        } else {
            temperature.clamp(0.0, MAX_TEMPERATURE)
        };
    }
}

/// Browser options from the advanced settings panel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSettings {
    pub headless: bool,
    pub disable_images: bool,
    pub block_ads: bool,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_parallel_tasks: u32,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            headless: false,
            disable_images: false,
            block_ads: false,
            user_agent: String::new(),
            timeout_secs: 30,
            max_parallel_tasks: 3,
        }
    }
}

/// External endpoints. Recorded only, never contacted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrations {
    pub workflow_endpoint: String,
    pub storage_url: String,
    #[serde(serialize_with = "redact")]
    pub storage_key: String,
}

impl Integrations {
    pub fn workflow_connected(&self) -> bool {
        !self.workflow_endpoint.trim().is_empty()
    }

    pub fn storage_connected(&self) -> bool {
        !self.storage_url.trim().is_empty() && !self.storage_key.is_empty()
    }
}

/// A named copy of the configuration
#[derive(Debug, Clone, Serialize)]
pub struct SavedConfig {
    pub name: String,
    pub config: BrowserConfig,
}

/// Named configurations kept for the session, in save order
#[derive(Debug, Default, Serialize)]
pub struct SavedConfigs {
    entries: Vec<SavedConfig>,
}

impl SavedConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `config` under `name`, replacing an earlier save with the same name
    pub fn save(&mut self, name: &str, config: &BrowserConfig) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidValue(
                "configuration name cannot be empty".to_string(),
            ));
        }

        let saved = SavedConfig {
            name: name.to_string(),
            config: config.clone(),
        };
        match self.entries.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                tracing::debug!("Overwriting saved configuration '{}'", name);
                *existing = saved;
            }
            None => self.entries.push(saved),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&BrowserConfig> {
        self.entries
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.config)
            .ok_or_else(|| Error::ConfigNotFound(name.to_string()))
    }

    pub fn list(&self) -> &[SavedConfig] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_provider_list() {
        let config = BrowserConfig::default();
        assert_eq!(config.provider(), Provider::OpenRouter);
        assert!(config.provider().offers(config.model()));
        assert_eq!(config.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(config.max_steps, 100);
        assert_eq!(config.tool_calling_method, ToolCallingMethod::Auto);
    }

    #[test]
    fn test_set_provider_resets_model() {
        let mut config = BrowserConfig::default();
        config.set_provider(Provider::Anthropic);
        assert_eq!(config.model(), "claude-3-opus");

        config.set_model("claude-3-haiku").unwrap();
        config.set_provider(Provider::Anthropic);
        assert_eq!(config.model(), "claude-3-opus");
    }

    #[test]
    fn test_set_model_outside_provider_is_rejected() {
        let mut config = BrowserConfig::default();
        config.set_provider(Provider::Groq);

        let err = config.set_model("gpt-4").unwrap_err();
        assert!(matches!(err, Error::ModelNotOffered { .. }));
        assert_eq!(config.model(), "llama3-70b");
    }

    #[test]
    fn test_temperature_is_clamped() {
        let mut config = BrowserConfig::default();
        config.set_temperature(3.5);
        assert_eq!(config.temperature(), 2.0);
        config.set_temperature(-1.0);
        assert_eq!(config.temperature(), 0.0);
        config.set_temperature(f64::NAN);
        assert_eq!(config.temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!(matches!(
            "mistral-cloud".parse::<Provider>(),
            Err(Error::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_secrets_are_redacted_when_serialized() {
        let mut config = BrowserConfig::default();
        config.set_api_key("sk-live-123");
        config.integrations.storage_key = "anon".to_string();

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["apiKey"], "********");
        assert_eq!(json["integrations"]["storageKey"], "********");
        assert_eq!(json["maxActionsPerStep"], 10);
    }

    #[test]
    fn test_saved_configs_overwrite_by_name() {
        let mut saved = SavedConfigs::new();
        let mut config = BrowserConfig::default();
        saved.save("fast", &config).unwrap();

        config.set_provider(Provider::Groq);
        saved.save("fast", &config).unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved.get("fast").unwrap().provider(), Provider::Groq);
        assert!(matches!(saved.get("slow"), Err(Error::ConfigNotFound(_))));
        assert!(saved.save("  ", &config).is_err());
    }

    #[test]
    fn test_saved_configs_redact_api_key() {
        let mut saved = SavedConfigs::new();
        let mut config = BrowserConfig::default();
        config.set_api_key("sk-live-123");
        saved.save("work", &config).unwrap();

        let json = serde_json::to_string(&saved).unwrap();
        assert!(!json.contains("sk-live-123"));
        assert_eq!(saved.get("work").unwrap().api_key(), "sk-live-123");
    }
}
