use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{decode, guarded, respond, Agent, AgentCore, ESCALATION_KEY};
use crate::error::{OrchestrationError, Result};
use crate::models::{self, HealthReading};
use crate::providers::TextGenerator;
use crate::storage::PersistenceStore;
use crate::types::payload::HealthHistoryPayload;
use crate::types::{AgentKind, AgentRequest, AgentResponse, Priority};

const TABLES: &[&str] = &["health_readings"];
const SYSTEM_PROMPT: &str =
    "You are a health monitoring agent. Watch vital signs and flag readings that need attention.";

/// Scores incoming vital signs and forecasts heart rate from recent history.
///
/// An anomalous reading moves the agent to `warning` and escalates a
/// `health_data` request; the next normal reading clears the warning.
pub struct HealthMonitoringAgent {
    core: AgentCore,
}

impl HealthMonitoringAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let core = AgentCore::new(AgentKind::HealthMonitoring, id, name, model, store)
            .with_tables(TABLES)
            .with_system_prompt(SYSTEM_PROMPT);
        Self { core }
    }

    pub fn with_generator(self, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            core: self.core.with_generator(generator),
        }
    }

    async fn process_reading(&self, request: &AgentRequest) -> Result<Value> {
        let reading: HealthReading = decode(request)?;
        let result = models::score(&reading);

        self.core
            .record(
                "health_readings",
                json!({ "reading": request.data, "anomalyScore": result.anomaly_score }),
            )
            .await?;

        if !result.is_anomaly {
            self.core.clear_status().await;
            return Ok(json!({ "anomaly": result }));
        }

        log::warn!("{}: anomalous reading ({})", self.core.name(), result.details);
        self.core.report_anomaly().await;

        let escalation = AgentRequest::new("health_data", request.data.clone())
            .with_source(AgentKind::HealthMonitoring)
            .with_priority(Priority::High);
        Ok(json!({ "anomaly": result, ESCALATION_KEY: escalation }))
    }

    fn process_history(&self, request: &AgentRequest) -> Result<Value> {
        let payload: HealthHistoryPayload = decode(request)?;
        let forecast = models::forecast_heart_rate(&payload.history);
        Ok(json!({ "forecast": forecast }))
    }
}

#[async_trait]
impl Agent for HealthMonitoringAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, request: AgentRequest) -> AgentResponse {
        log::debug!("{} processing {}", self.core.name(), request.request_type);
        let outcome = guarded(&request.request_type, async {
            match request.request_type.as_str() {
                "health_reading" => self.process_reading(&request).await,
                "health_history" => self.process_history(&request),
                other => Err(OrchestrationError::UnknownRequestType(other.to_string())),
            }
        })
        .await;
        respond(AgentKind::HealthMonitoring, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::types::AgentStatus;

    async fn agent(store: &InMemoryStore) -> HealthMonitoringAgent {
        let agent = HealthMonitoringAgent::new(
            "health-monitoring",
            "Health Monitoring Agent",
            "mistral",
            Arc::new(store.connect()),
        );
        agent.initialize().await.unwrap();
        agent
    }

    #[tokio::test]
    async fn test_anomalous_reading_escalates_and_warns() {
        let store = InMemoryStore::new();
        let agent = agent(&store).await;

        let response = agent
            .process(AgentRequest::new(
                "health_reading",
                json!({ "heartRate": 120, "temperature": 39.1 }),
            ))
            .await;
        assert!(response.success);

        let data = response.data.unwrap();
        assert_eq!(data["anomaly"]["isAnomaly"], true);
        assert_eq!(data[ESCALATION_KEY]["type"], "health_data");
        assert_eq!(data[ESCALATION_KEY]["priority"], "high");
        assert_eq!(agent.status().await, AgentStatus::Warning);
        assert_eq!(store.row_count("health_readings").unwrap(), 1);

        let response = agent
            .process(AgentRequest::new("health_reading", json!({ "heartRate": 72 })))
            .await;
        assert!(response.data.unwrap().get(ESCALATION_KEY).is_none());
        assert_eq!(agent.status().await, AgentStatus::Active);
    }

    #[tokio::test]
    async fn test_history_forecast() {
        let store = InMemoryStore::new();
        let agent = agent(&store).await;

        let response = agent
            .process(AgentRequest::new(
                "health_history",
                json!({ "history": [{ "heartRate": 70 }, { "heartRate": 72 }, { "heartRate": 74 }] }),
            ))
            .await;
        let forecast = &response.data.unwrap()["forecast"];
        assert_eq!(forecast["prediction"], 72.0);
    }

    #[tokio::test]
    async fn test_unknown_request_type() {
        let store = InMemoryStore::new();
        let agent = agent(&store).await;

        let response = agent.process(AgentRequest::new("dance", json!({}))).await;
        assert!(!response.success);
        assert_eq!(response.source, AgentKind::HealthMonitoring);
    }
}
