use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an agent is meant to automate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    #[default]
    BrowserUse,
    WebScraper,
    FormFiller,
    EmailAutomation,
    DataEnricher,
    Custom,
}

impl AgentKind {
    pub const ALL: [AgentKind; 6] = [
        AgentKind::BrowserUse,
        AgentKind::WebScraper,
        AgentKind::FormFiller,
        AgentKind::EmailAutomation,
        AgentKind::DataEnricher,
        AgentKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::BrowserUse => "browser-use",
            AgentKind::WebScraper => "web-scraper",
            AgentKind::FormFiller => "form-filler",
            AgentKind::EmailAutomation => "email-automation",
            AgentKind::DataEnricher => "data-enricher",
            AgentKind::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::BrowserUse => "Browser-Use Agent",
            AgentKind::WebScraper => "Web Scraper",
            AgentKind::FormFiller => "Form Filler",
            AgentKind::EmailAutomation => "Email Automation",
            AgentKind::DataEnricher => "Data Enricher",
            AgentKind::Custom => "Custom Agent",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AgentKind::ALL
            .iter()
            .find(|k| k.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| Error::InvalidValue(format!("unknown agent kind '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    fn toggled(self) -> Self {
        match self {
            AgentStatus::Active => AgentStatus::Inactive,
            AgentStatus::Inactive => AgentStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub prompt: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

/// Created agent definitions, in creation order
#[derive(Debug, Default, Serialize)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
    #[serde(skip)]
    next_id: u64,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new agent with status `active`
    ///
    /// Returns `None` without touching the registry when `name` is empty.
    /// Whitespace counts as a name.
    pub fn create_agent(&mut self, name: &str, kind: AgentKind, prompt: &str) -> Option<&Agent> {
        if name.is_empty() {
            tracing::debug!("Ignoring agent creation with empty name");
            return None;
        }

        self.next_id += 1;
        self.agents.push(Agent {
            id: self.next_id,
            name: name.to_string(),
            kind,
            prompt: prompt.to_string(),
            status: AgentStatus::Active,
            created_at: Utc::now(),
        });
        tracing::debug!("Created agent {} '{}' ({})", self.next_id, name, kind);
        self.agents.last()
    }

    /// Flip an agent between active and inactive, returning the new status
    pub fn toggle_status(&mut self, id: u64) -> Result<AgentStatus> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(Error::AgentNotFound(id))?;
        agent.status = agent.status.toggled();
        Ok(agent.status)
    }

    pub fn remove(&mut self, id: u64) -> Result<Agent> {
        let idx = self
            .agents
            .iter()
            .position(|a| a.id == id)
            .ok_or(Error::AgentNotFound(id))?;
        Ok(self.agents.remove(idx))
    }

    pub fn get(&self, id: u64) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn list(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_agent_with_empty_name_is_noop() {
        let mut registry = AgentRegistry::new();
        assert!(registry.create_agent("", AgentKind::Custom, "x").is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_create_agent_keeps_whitespace_name() {
        let mut registry = AgentRegistry::new();
        let agent = registry.create_agent("   ", AgentKind::Custom, "x").unwrap();

        assert_eq!(agent.name, "   ");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_agent_serializes_kind_as_type() {
        let mut registry = AgentRegistry::new();
        let agent = registry
            .create_agent("Mailer", AgentKind::EmailAutomation, "")
            .unwrap();
        let json = serde_json::to_value(agent).unwrap();

        assert_eq!(json["type"], "email-automation");
        assert!(json.get("kind").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_create_agent_defaults_to_active() {
        let mut registry = AgentRegistry::new();
        let agent = registry
            .create_agent("Scraper", AgentKind::WebScraper, "collect prices")
            .unwrap();

        assert_eq!(agent.status, AgentStatus::Active);
        assert_eq!(agent.kind, AgentKind::WebScraper);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_agent_ids_are_unique() {
        let mut registry = AgentRegistry::new();
        let a = registry.create_agent("a", AgentKind::Custom, "").unwrap().id;
        let b = registry.create_agent("b", AgentKind::Custom, "").unwrap().id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_toggle_and_remove() {
        let mut registry = AgentRegistry::new();
        let id = registry
            .create_agent("Filler", AgentKind::FormFiller, "")
            .unwrap()
            .id;

        assert_eq!(registry.toggle_status(id).unwrap(), AgentStatus::Inactive);
        assert_eq!(registry.toggle_status(id).unwrap(), AgentStatus::Active);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.name, "Filler");
        assert!(registry.is_empty());
        assert!(matches!(registry.remove(id), Err(Error::AgentNotFound(_))));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            "email-automation".parse::<AgentKind>().unwrap(),
            AgentKind::EmailAutomation
        );
        assert!("crawler".parse::<AgentKind>().is_err());
    }
}
