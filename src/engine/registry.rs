use futures::future::join_all;
use futures::Stream;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::agents::{
    Agent, AgentHandle, OrchestratorAgent, ESCALATION_KEY, ESCALATION_RESULT_KEY,
};
use crate::error::{OrchestrationError, Result};
use crate::types::{AgentId, AgentKind, AgentRequest, AgentResponse, AgentSnapshot};

const EVENT_CAPACITY: usize = 64;

/// Lifecycle signals published by the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    Registered { agent_id: AgentId, kind: AgentKind },
    Ready { initialized: usize, failed: usize },
    ShutDown { stopped: usize, failed: usize },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::Registered { .. } => "registered",
            RegistryEvent::Ready { .. } => "ready",
            RegistryEvent::ShutDown { .. } => "shutdown",
        }
    }
}

/// Per-agent outcome of a bulk lifecycle operation.
#[derive(Debug, Default)]
pub struct LifecycleReport {
    pub succeeded: Vec<AgentId>,
    pub failed: Vec<OrchestrationError>,
}

impl LifecycleReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, agent_id: &str, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.succeeded.push(agent_id.to_string()),
            Err(e) => {
                log::error!("{}", e);
                self.failed.push(e);
            }
        }
    }
}

/// Owns every agent and the reference to the single routing orchestrator.
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, Arc<AgentHandle>>,
    orchestrator_id: Option<AgentId>,
    events: broadcast::Sender<RegistryEvent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            agents: BTreeMap::new(),
            orchestrator_id: None,
            events,
        }
    }

    /// Adds an agent keyed by id. Re-registering an id overwrites the prior
    /// entry; a second orchestrator under a different id is rejected.
    pub fn register(&mut self, agent: impl Into<AgentHandle>) -> Result<()> {
        let agent = agent.into();
        let id = agent.id().to_string();

        if agent.kind().is_orchestrator() {
            if let Some(existing) = self.orchestrator_id.as_ref().filter(|e| **e != id) {
                return Err(OrchestrationError::DuplicateOrchestrator {
                    existing: existing.clone(),
                    rejected: id,
                });
            }
            self.orchestrator_id = Some(id.clone());
        } else if self.orchestrator_id.as_deref() == Some(id.as_str()) {
            self.orchestrator_id = None;
        }

        self.insert(id, agent);
        Ok(())
    }

    /// Swaps the routing orchestrator, returning the one it replaced.
    pub fn replace_orchestrator(
        &mut self,
        orchestrator: OrchestratorAgent,
    ) -> Option<Arc<AgentHandle>> {
        let previous = self
            .orchestrator_id
            .take()
            .and_then(|id| self.agents.remove(&id));
        if let Some(previous) = &previous {
            log::warn!("Replacing orchestrator {}", previous.id());
        }

        let id = orchestrator.id().to_string();
        self.orchestrator_id = Some(id.clone());
        self.insert(id, AgentHandle::Orchestrator(orchestrator));
        previous
    }

    fn insert(&mut self, id: AgentId, agent: AgentHandle) {
        log::info!("Agent registered: {} ({})", agent.name(), id);
        let kind = agent.kind();
        self.agents.insert(id.clone(), Arc::new(agent));
        self.emit(RegistryEvent::Registered { agent_id: id, kind });
    }

    pub fn get(&self, id: &str) -> Option<Arc<AgentHandle>> {
        self.agents.get(id).cloned()
    }

    pub fn all(&self) -> Vec<Arc<AgentHandle>> {
        self.agents.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn orchestrator(&self) -> Option<&OrchestratorAgent> {
        self.orchestrator_handle()
            .and_then(|handle| handle.as_orchestrator())
    }

    fn orchestrator_handle(&self) -> Option<&Arc<AgentHandle>> {
        self.orchestrator_id
            .as_ref()
            .and_then(|id| self.agents.get(id))
    }

    pub async fn statuses(&self) -> Vec<AgentSnapshot> {
        join_all(self.agents.values().map(|agent| agent.snapshot())).await
    }

    /// Initializes the orchestrator, then every other agent concurrently.
    /// Failures are collected per agent and never stop the siblings.
    pub async fn initialize_all(&self) -> LifecycleReport {
        log::info!("Initializing all agents...");
        let mut report = LifecycleReport::default();

        if let Some(orchestrator) = self.orchestrator_handle() {
            report.record(orchestrator.id(), orchestrator.initialize().await);
        }

        let workers = self
            .agents
            .iter()
            .filter(|(id, _)| self.orchestrator_id.as_ref() != Some(*id))
            .map(|(id, agent)| async move { (id, agent.initialize().await) });
        for (id, outcome) in join_all(workers).await {
            report.record(id, outcome);
        }

        log::info!(
            "All agents initialized ({} ready, {} failed)",
            report.succeeded.len(),
            report.failed.len()
        );
        self.emit(RegistryEvent::Ready {
            initialized: report.succeeded.len(),
            failed: report.failed.len(),
        });
        report
    }

    /// Shuts every agent down concurrently. Safe to call repeatedly.
    pub async fn shutdown_all(&self) -> LifecycleReport {
        log::info!("Shutting down all agents...");
        let mut report = LifecycleReport::default();

        let shutdowns = self
            .agents
            .iter()
            .map(|(id, agent)| async move { (id, agent.shutdown().await) });
        for (id, outcome) in join_all(shutdowns).await {
            report.record(id, outcome);
        }

        log::info!("All agents shut down");
        self.emit(RegistryEvent::ShutDown {
            stopped: report.succeeded.len(),
            failed: report.failed.len(),
        });
        report
    }

    /// Routes a request through the orchestrator.
    pub async fn process(&self, request: AgentRequest) -> Result<AgentResponse> {
        let orchestrator = self
            .orchestrator_handle()
            .ok_or(OrchestrationError::NoOrchestrator)?;
        Ok(orchestrator.process(request).await)
    }

    /// Like `process`, but gives up after `timeout`. Other in-flight requests
    /// are unaffected.
    pub async fn process_with_timeout(
        &self,
        request: AgentRequest,
        timeout: Duration,
    ) -> Result<AgentResponse> {
        let request_type = request.request_type.clone();
        match tokio::time::timeout(timeout, self.process(request)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!("Request {} timed out", request_type);
                Ok(AgentResponse::failure(
                    AgentKind::Orchestrator,
                    OrchestrationError::Timeout {
                        request_type,
                        millis: timeout.as_millis(),
                    },
                ))
            }
        }
    }

    /// Processes a request on one agent. A worker's escalation is forwarded
    /// to the orchestrator and its answer attached to the worker's response.
    pub async fn dispatch_to(&self, agent_id: &str, request: AgentRequest) -> Result<AgentResponse> {
        let agent = self
            .get(agent_id)
            .ok_or_else(|| OrchestrationError::AgentNotFound(agent_id.to_string()))?;
        let mut response = agent.process(request).await;

        if agent.kind().is_orchestrator() {
            return Ok(response);
        }

        let Some(data) = response.data.as_mut() else {
            return Ok(response);
        };
        let Some(escalation) = data.get(ESCALATION_KEY).cloned() else {
            return Ok(response);
        };

        let escalation: AgentRequest = serde_json::from_value(escalation).map_err(|e| {
            OrchestrationError::InvalidPayload {
                request_type: ESCALATION_KEY.to_string(),
                reason: e.to_string(),
            }
        })?;

        match self.orchestrator_handle() {
            Some(orchestrator) => {
                log::debug!(
                    "Forwarding {} from {} to orchestrator",
                    escalation.request_type,
                    agent_id
                );
                let result = orchestrator.process(escalation).await;
                data[ESCALATION_RESULT_KEY] = serde_json::to_value(result).map_err(|e| {
                    OrchestrationError::HandlerFault(e.to_string())
                })?;
            }
            None => log::warn!(
                "No orchestrator to receive {} from {}",
                escalation.request_type,
                agent_id
            ),
        }

        Ok(response)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Registry events as a stream. Lagged events are skipped.
    pub fn event_stream(&self) -> impl Stream<Item = RegistryEvent> + Send + 'static {
        BroadcastStream::new(self.events.subscribe()).filter_map(|event| event.ok())
    }

    fn emit(&self, event: RegistryEvent) {
        log::debug!("Registry event: {}", event.name());
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{HealthMonitoringAgent, SafetyActivityAgent};
    use crate::storage::InMemoryStore;
    use crate::types::AgentStatus;
    use serde_json::json;

    fn orchestrator(id: &str, store: &InMemoryStore) -> OrchestratorAgent {
        OrchestratorAgent::new(id, "Central Orchestration Agent", "mistral", Arc::new(store.connect()))
    }

    #[test]
    fn test_second_orchestrator_is_rejected() {
        let store = InMemoryStore::new();
        let mut registry = AgentRegistry::new();
        registry.register(orchestrator("orc-1", &store)).unwrap();

        let err = registry.register(orchestrator("orc-2", &store)).unwrap_err();
        assert!(matches!(err, OrchestrationError::DuplicateOrchestrator { .. }));
        assert!(registry.get("orc-2").is_none());

        // Same id is a plain overwrite
        registry.register(orchestrator("orc-1", &store)).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_replace_orchestrator() {
        let store = InMemoryStore::new();
        let mut registry = AgentRegistry::new();
        registry.register(orchestrator("orc-1", &store)).unwrap();

        let previous = registry.replace_orchestrator(orchestrator("orc-2", &store));
        assert_eq!(previous.unwrap().id(), "orc-1");
        assert_eq!(registry.orchestrator().unwrap().id(), "orc-2");
        assert!(registry.get("orc-1").is_none());
    }

    #[tokio::test]
    async fn test_process_without_orchestrator() {
        let registry = AgentRegistry::new();
        let err = registry
            .process(AgentRequest::new("get_alerts", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::NoOrchestrator));
    }

    #[tokio::test]
    async fn test_dispatch_to_forwards_escalation() {
        let store = InMemoryStore::new();
        let mut registry = AgentRegistry::new();
        registry.register(orchestrator("orc", &store)).unwrap();
        registry
            .register(SafetyActivityAgent::new(
                "safety",
                "Safety & Activity Agent",
                "llama2",
                Arc::new(store.connect()),
            ))
            .unwrap();
        assert!(registry.initialize_all().await.is_success());

        let response = registry
            .dispatch_to(
                "safety",
                AgentRequest::new(
                    "activity_sample",
                    json!({ "acceleration": { "x": 0, "y": 0, "z": -20 } }),
                ),
            )
            .await
            .unwrap();
        let data = response.data.unwrap();
        assert_eq!(data[ESCALATION_RESULT_KEY]["success"], true);

        let alert_id = data[ESCALATION_RESULT_KEY]["data"]["alertId"].as_str().unwrap();
        let alerts = registry
            .orchestrator()
            .unwrap()
            .alerts(&Default::default())
            .await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, alert_id);

        let missing = registry
            .dispatch_to("nobody", AgentRequest::new("x", json!({})))
            .await;
        assert!(matches!(missing, Err(OrchestrationError::AgentNotFound(_))));
    }

    #[tokio::test]
    async fn test_statuses_and_events() {
        let store = InMemoryStore::new();
        let mut registry = AgentRegistry::new();
        let mut events = registry.subscribe();

        registry.register(orchestrator("orc", &store)).unwrap();
        registry
            .register(HealthMonitoringAgent::new(
                "health",
                "Health Monitoring Agent",
                "mistral",
                Arc::new(store.connect()),
            ))
            .unwrap();
        registry.initialize_all().await;

        let statuses = registry.statuses().await;
        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| s.status == AgentStatus::Active));

        let names: Vec<&str> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.name())
            .collect();
        assert_eq!(names, vec!["registered", "registered", "ready"]);
    }
}
