use std::sync::Arc;

use crate::agents::{
    AgentHandle, CaregiverCoordinationAgent, HealthMonitoringAgent,
    OrchestratorAgent, ReminderScheduleAgent, SafetyActivityAgent, SocialEngagementAgent,
};
use crate::config::{AgentSpec, Config};
use crate::engine::alert_log::DEFAULT_ALERT_CAPACITY;
use crate::engine::AgentRegistry;
use crate::error::Result;
use crate::providers::TextGenerator;
use crate::storage::StoreFactory;
use crate::types::AgentKind;

#[derive(Debug, Clone)]
pub struct FactoryConfig {
    pub alert_capacity: usize,
    /// Model for roster entries that leave theirs empty.
    pub default_model: String,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            default_model: "mistral".to_string(),
        }
    }
}

impl From<&Config> for FactoryConfig {
    fn from(config: &Config) -> Self {
        Self {
            alert_capacity: config.alert_capacity,
            default_model: config.text_model.clone(),
        }
    }
}

/// Builds agents from roster entries. Each agent gets its own persistence
/// handle from the store factory and shares the optional text generator.
pub struct AgentFactory {
    stores: StoreFactory,
    generator: Option<Arc<dyn TextGenerator>>,
    config: FactoryConfig,
}

impl AgentFactory {
    pub fn new(stores: StoreFactory, config: FactoryConfig) -> Self {
        Self {
            stores,
            generator: None,
            config,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn build(&self, spec: &AgentSpec) -> AgentHandle {
        let store = (self.stores)();
        let model = if spec.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            spec.model.as_str()
        };
        let (id, name) = (spec.id.as_str(), spec.name.as_str());

        let handle: AgentHandle = match spec.kind {
            AgentKind::Orchestrator => OrchestratorAgent::new(id, name, model, store)
                .with_alert_capacity(self.config.alert_capacity)
                .into(),
            AgentKind::HealthMonitoring => HealthMonitoringAgent::new(id, name, model, store).into(),
            AgentKind::SafetyActivity => SafetyActivityAgent::new(id, name, model, store).into(),
            AgentKind::ReminderSchedule => ReminderScheduleAgent::new(id, name, model, store).into(),
            AgentKind::CaregiverCoordination => {
                CaregiverCoordinationAgent::new(id, name, model, store).into()
            }
            AgentKind::SocialEngagement => SocialEngagementAgent::new(id, name, model, store).into(),
        };

        match &self.generator {
            Some(generator) => attach_generator(handle, generator.clone()),
            None => handle,
        }
    }

    /// Builds and registers every agent of the roster.
    pub fn build_registry(&self, roster: &[AgentSpec]) -> Result<AgentRegistry> {
        let mut registry = AgentRegistry::new();
        for spec in roster {
            registry.register(self.build(spec))?;
        }
        Ok(registry)
    }
}

fn attach_generator(handle: AgentHandle, generator: Arc<dyn TextGenerator>) -> AgentHandle {
    match handle {
        AgentHandle::Orchestrator(agent) => agent.with_generator(generator).into(),
        AgentHandle::HealthMonitoring(agent) => agent.with_generator(generator).into(),
        AgentHandle::SafetyActivity(agent) => agent.with_generator(generator).into(),
        AgentHandle::ReminderSchedule(agent) => agent.with_generator(generator).into(),
        AgentHandle::CaregiverCoordination(agent) => agent.with_generator(generator).into(),
        AgentHandle::SocialEngagement(agent) => agent.with_generator(generator).into(),
    }
}
