use crate::OutputFormat;
use anyhow::{Result, anyhow};
use std::str::FromStr;
use studio_core::config::{BrowserConfig, Provider, ToolCallingMethod};
use studio_core::{Action, Studio};

/// Provider and model overrides shared by `chat` and `config show`
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub api_key: Option<String>,
}

impl ConfigOverrides {
    /// Translate overrides into studio actions, provider first so the model
    /// is checked against the right list
    pub fn actions(&self) -> Result<Vec<Action>> {
        let mut actions = Vec::new();
        if let Some(provider) = &self.provider {
            actions.push(Action::SetProvider(provider.parse::<Provider>()?));
        }
        if let Some(model) = &self.model {
            actions.push(Action::SetModel(model.clone()));
        }
        if let Some(temperature) = self.temperature {
            actions.push(Action::SetTemperature(temperature));
        }
        if let Some(key) = &self.api_key {
            actions.push(Action::SetApiKey(key.clone()));
        }
        Ok(actions)
    }
}

#[derive(Debug, serde::Serialize)]
struct ProviderInfo {
    provider: &'static str,
    label: &'static str,
    models: &'static [&'static str],
}

/// List providers and the models each one offers
pub fn providers(format: OutputFormat) -> Result<()> {
    let infos: Vec<ProviderInfo> = Provider::ALL
        .iter()
        .map(|p| ProviderInfo {
            provider: p.as_str(),
            label: p.label(),
            models: p.models(),
        })
        .collect();

    let output = match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&infos)?),
        OutputFormat::Table => {
            let mut output = String::from("Provider,Model,Default\n");
            for info in &infos {
                for (idx, model) in info.models.iter().enumerate() {
                    output.push_str(&format!("{},{},{}\n", info.provider, model, idx == 0));
                }
            }
            output
        }
        OutputFormat::Pretty => {
            use console::style;

            let mut output = String::new();
            for info in &infos {
                output.push_str(&format!(
                    "{} {}\n",
                    style(info.provider).bold().cyan(),
                    style(format!("({})", info.label)).dim()
                ));
                for (idx, model) in info.models.iter().enumerate() {
                    let marker = if idx == 0 { "* " } else { "  " };
                    output.push_str(&format!("  {}{}\n", marker, model));
                }
            }
            output.push_str("\n* = model selected when switching to the provider\n");
            output
        }
    };

    print!("{}", output);
    Ok(())
}

/// Print the effective configuration after applying overrides
pub fn show(overrides: &ConfigOverrides, format: OutputFormat) -> Result<()> {
    let mut studio = Studio::default();
    for action in overrides.actions()? {
        studio.dispatch(action)?;
    }

    print!("{}", render(&studio.state().config, format)?);
    Ok(())
}

/// Render a configuration in the requested format
pub fn render(config: &BrowserConfig, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(config)?),
        OutputFormat::Table => format_table(config)?,
        OutputFormat::Pretty => format_pretty(config),
    })
}

/// A setting that can be changed from a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Provider,
    Model,
    ApiKey,
    BaseUrl,
    Temperature,
    MaxSteps,
    MaxActions,
    Vision,
    Screenshots,
    ToolCalling,
    Headless,
    DisableImages,
    BlockAds,
    UserAgent,
    Timeout,
    MaxParallel,
    Workflow,
    StorageUrl,
    StorageKey,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 19] = [
        ConfigKey::Provider,
        ConfigKey::Model,
        ConfigKey::ApiKey,
        ConfigKey::BaseUrl,
        ConfigKey::Temperature,
        ConfigKey::MaxSteps,
        ConfigKey::MaxActions,
        ConfigKey::Vision,
        ConfigKey::Screenshots,
        ConfigKey::ToolCalling,
        ConfigKey::Headless,
        ConfigKey::DisableImages,
        ConfigKey::BlockAds,
        ConfigKey::UserAgent,
        ConfigKey::Timeout,
        ConfigKey::MaxParallel,
        ConfigKey::Workflow,
        ConfigKey::StorageUrl,
        ConfigKey::StorageKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Provider => "provider",
            ConfigKey::Model => "model",
            ConfigKey::ApiKey => "api-key",
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::Temperature => "temperature",
            ConfigKey::MaxSteps => "max-steps",
            ConfigKey::MaxActions => "max-actions",
            ConfigKey::Vision => "vision",
            ConfigKey::Screenshots => "screenshots",
            ConfigKey::ToolCalling => "tool-calling",
            ConfigKey::Headless => "headless",
            ConfigKey::DisableImages => "disable-images",
            ConfigKey::BlockAds => "block-ads",
            ConfigKey::UserAgent => "user-agent",
            ConfigKey::Timeout => "timeout",
            ConfigKey::MaxParallel => "max-parallel",
            ConfigKey::Workflow => "workflow",
            ConfigKey::StorageUrl => "storage-url",
            ConfigKey::StorageKey => "storage-key",
        }
    }

    /// Build the action that sets this key to `value`
    ///
    /// Keys stored in a group (advanced options, storage) start from the
    /// current values so the other members are kept.
    pub fn action(self, value: &str, current: &BrowserConfig) -> Result<Action> {
        let value = value.trim();
        let action = match self {
            ConfigKey::Provider => Action::SetProvider(value.parse::<Provider>()?),
            ConfigKey::Model => Action::SetModel(value.to_string()),
            ConfigKey::ApiKey => Action::SetApiKey(value.to_string()),
            ConfigKey::BaseUrl => Action::SetBaseUrl(value.to_string()),
            ConfigKey::Temperature => Action::SetTemperature(parse_number(self, value)?),
            ConfigKey::MaxSteps => Action::SetMaxSteps(parse_number(self, value)?),
            ConfigKey::MaxActions => Action::SetMaxActionsPerStep(parse_number(self, value)?),
            ConfigKey::Vision => Action::SetUseVision(parse_flag(self, value)?),
            ConfigKey::Screenshots => Action::SetEnableScreenshot(parse_flag(self, value)?),
            ConfigKey::ToolCalling => {
                Action::SetToolCallingMethod(value.parse::<ToolCallingMethod>()?)
            }
            ConfigKey::Headless
            | ConfigKey::DisableImages
            | ConfigKey::BlockAds
            | ConfigKey::UserAgent
            | ConfigKey::Timeout
            | ConfigKey::MaxParallel => {
                let mut advanced = current.advanced.clone();
                match self {
                    ConfigKey::Headless => advanced.headless = parse_flag(self, value)?,
                    ConfigKey::DisableImages => advanced.disable_images = parse_flag(self, value)?,
                    ConfigKey::BlockAds => advanced.block_ads = parse_flag(self, value)?,
                    ConfigKey::UserAgent => advanced.user_agent = value.to_string(),
                    ConfigKey::Timeout => advanced.timeout_secs = parse_number(self, value)?,
                    _ => advanced.max_parallel_tasks = parse_number(self, value)?,
                }
                Action::SetAdvanced(advanced)
            }
            ConfigKey::Workflow => Action::SetWorkflowEndpoint(value.to_string()),
            ConfigKey::StorageUrl => Action::SetStorage {
                url: value.to_string(),
                key: current.integrations.storage_key.clone(),
            },
            ConfigKey::StorageKey => Action::SetStorage {
                url: current.integrations.storage_url.clone(),
                key: value.to_string(),
            },
        };
        Ok(action)
    }
}

impl FromStr for ConfigKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase().replace('_', "-");
        ConfigKey::ALL
            .iter()
            .find(|k| k.as_str() == needle)
            .copied()
            .ok_or_else(|| {
                let keys: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
                anyhow!("Unknown setting '{}'. Known settings: {}", s, keys.join(", "))
            })
    }
}

fn parse_number<T: FromStr>(key: ConfigKey, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid number for {}: {}", key.as_str(), value))
}

fn parse_flag(key: ConfigKey, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" => Ok(true),
        "false" | "off" | "no" => Ok(false),
        _ => Err(anyhow!("Expected on/off for {}: {}", key.as_str(), value)),
    }
}

fn format_table(config: &BrowserConfig) -> Result<String> {
    let value = serde_json::to_value(config)?;
    let mut output = String::from("Key,Value\n");
    if let Some(map) = value.as_object() {
        for (key, value) in map {
            if value.is_object() {
                continue;
            }
            output.push_str(&format!("{},{}\n", key, value));
        }
    }
    Ok(output)
}

fn format_pretty(config: &BrowserConfig) -> String {
    use console::style;

    let api_key = if config.api_key().is_empty() {
        "(not set)"
    } else {
        "********"
    };

    let mut output = String::new();
    output.push_str(&format!("{}\n", style("LLM Provider Settings").bold().cyan()));
    output.push_str(&format!(
        "  Provider:           {} ({})\n",
        config.provider(),
        config.provider().label()
    ));
    output.push_str(&format!("  Model:              {}\n", config.model()));
    output.push_str(&format!("  API Key:            {}\n", api_key));
    output.push_str(&format!("  Base URL:           {}\n", config.base_url));
    output.push_str(&format!("  Temperature:        {:.1}\n", config.temperature()));
    output.push('\n');
    output.push_str(&format!("{}\n", style("Agent Settings").bold().cyan()));
    output.push_str(&format!("  Max Steps:          {}\n", config.max_steps));
    output.push_str(&format!("  Max Actions/Step:   {}\n", config.max_actions_per_step));
    output.push_str(&format!("  Use Vision:         {}\n", config.use_vision));
    output.push_str(&format!("  Screenshots:        {}\n", config.enable_screenshot));
    output.push_str(&format!(
        "  Tool Calling:       {:?}\n",
        config.tool_calling_method
    ));
    output.push('\n');
    output.push_str(&format!("{}\n", style("Browser Options").bold().cyan()));
    let advanced = &config.advanced;
    output.push_str(&format!("  Headless:           {}\n", advanced.headless));
    output.push_str(&format!("  Disable Images:     {}\n", advanced.disable_images));
    output.push_str(&format!("  Block Ads:          {}\n", advanced.block_ads));
    output.push_str(&format!("  Timeout:            {}s\n", advanced.timeout_secs));
    output.push_str(&format!("  Max Parallel Tasks: {}\n", advanced.max_parallel_tasks));
    output.push('\n');
    output.push_str(&format!("{}\n", style("Integrations").bold().cyan()));
    let integrations = &config.integrations;
    output.push_str(&format!(
        "  Workflow:           {}\n",
        connection_label(integrations.workflow_connected())
    ));
    output.push_str(&format!(
        "  Storage:            {}\n",
        connection_label(integrations.storage_connected())
    ));

    output
}

fn connection_label(connected: bool) -> &'static str {
    if connected { "Connected" } else { "Not Connected" }
}
