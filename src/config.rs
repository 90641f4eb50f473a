use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::AgentKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama_url: String,
    pub text_model: String,
    pub embedding_model: String,
    pub api_port: u16,
    pub alert_capacity: usize,
    pub http: HttpToolConfig,
    pub scraper: ScraperConfig,
    pub agents: Vec<AgentSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpToolConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub default_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

/// One entry of the agent roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub kind: AgentKind,
    pub name: String,
    #[serde(default)]
    pub model: String,
}

impl AgentSpec {
    pub fn new(id: &str, kind: AgentKind, name: &str, model: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            model: model.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: crate::providers::ollama::DEFAULT_OLLAMA_URL.to_string(),
            text_model: "mistral".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_port: 3000,
            alert_capacity: crate::engine::alert_log::DEFAULT_ALERT_CAPACITY,
            http: HttpToolConfig::default(),
            scraper: ScraperConfig::default(),
            agents: default_roster(),
        }
    }
}

impl Default for HttpToolConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retries: 3,
            default_headers: BTreeMap::new(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: "SevaSahayak/1.0 WebScraperTool".to_string(),
        }
    }
}

pub fn default_roster() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new(
            "central-orchestration",
            AgentKind::Orchestrator,
            "Central Orchestration Agent",
            "mistral:7b",
        ),
        AgentSpec::new(
            "health-monitoring",
            AgentKind::HealthMonitoring,
            "Health Monitoring Agent",
            "mistral:7b",
        ),
        AgentSpec::new(
            "safety-activity",
            AgentKind::SafetyActivity,
            "Safety & Activity Agent",
            "llama2:7b",
        ),
        AgentSpec::new(
            "reminder-schedule",
            AgentKind::ReminderSchedule,
            "Reminder & Schedule Agent",
            "phi3:mini",
        ),
        AgentSpec::new(
            "caregiver-coordination",
            AgentKind::CaregiverCoordination,
            "Caregiver Coordination Agent",
            "llama2:7b",
        ),
        AgentSpec::new(
            "social-engagement",
            AgentKind::SocialEngagement,
            "Social Engagement Agent",
            "gemma:2b",
        ),
    ]
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Reads a TOML or YAML file, picked by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&raw)
                .with_context(|| format!("Invalid TOML in {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)
                .with_context(|| format!("Invalid YAML in {}", path.display())),
            other => Err(anyhow!(
                "Unsupported config format {:?} for {}",
                other,
                path.display()
            )),
        }
    }

    /// File (or defaults) first, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("SEVA_OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Ok(model) = std::env::var("SEVA_TEXT_MODEL") {
            self.text_model = model;
        }
        if let Ok(model) = std::env::var("SEVA_EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Some(port) = std::env::var("SEVA_API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.api_port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.alert_capacity, 100);
        assert_eq!(config.http.retries, 3);
        assert_eq!(config.agents.len(), 6);
        assert_eq!(
            config
                .agents
                .iter()
                .filter(|a| a.kind.is_orchestrator())
                .count(),
            1
        );
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
text_model = "llama3.1"
alert_capacity = 50

[http]
retries = 5

[[agents]]
id = "orc"
kind = "central-orchestration"
name = "Orchestrator"
model = "llama3.1"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.text_model, "llama3.1");
        assert_eq!(config.alert_capacity, 50);
        assert_eq!(config.http.retries, 5);
        assert_eq!(config.http.timeout_ms, 10_000);
        assert_eq!(config.agents.len(), 1);
        assert_eq!(config.agents[0].kind, AgentKind::Orchestrator);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "embedding_model: all-minilm\nscraper:\n  user_agent: TestAgent/0.1\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.embedding_model, "all-minilm");
        assert_eq!(config.scraper.user_agent, "TestAgent/0.1");
        assert_eq!(config.scraper.timeout_ms, 30_000);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }
}
