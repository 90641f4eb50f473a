use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{decode, guarded, respond, Agent, AgentCore, ESCALATION_KEY};
use crate::error::{OrchestrationError, Result};
use crate::providers::TextGenerator;
use crate::storage::PersistenceStore;
use crate::types::payload::CaregiverMessagePayload;
use crate::types::{AgentKind, AgentRequest, AgentResponse, Priority};

const TABLES: &[&str] = &["messages"];
const SYSTEM_PROMPT: &str =
    "You are a caregiver coordination agent. Relay messages between the family and caregivers.";

pub struct CaregiverCoordinationAgent {
    core: AgentCore,
}

impl CaregiverCoordinationAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let core = AgentCore::new(AgentKind::CaregiverCoordination, id, name, model, store)
            .with_tables(TABLES)
            .with_system_prompt(SYSTEM_PROMPT);
        Self { core }
    }

    pub fn with_generator(self, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            core: self.core.with_generator(generator),
        }
    }

    async fn send_message(&self, request: &AgentRequest) -> Result<Value> {
        let message: CaregiverMessagePayload = decode(request)?;
        self.core.record("messages", json!(message)).await?;

        let priority = if message.important {
            Priority::High
        } else {
            Priority::Low
        };
        let escalation = AgentRequest::new("caregiver_message", json!(message))
            .with_source(AgentKind::CaregiverCoordination)
            .with_priority(priority);
        Ok(json!({ "queued": true, ESCALATION_KEY: escalation }))
    }
}

#[async_trait]
impl Agent for CaregiverCoordinationAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, request: AgentRequest) -> AgentResponse {
        log::debug!("{} processing {}", self.core.name(), request.request_type);
        let outcome = guarded(&request.request_type, async {
            match request.request_type.as_str() {
                "send_message" => self.send_message(&request).await,
                other => Err(OrchestrationError::UnknownRequestType(other.to_string())),
            }
        })
        .await;
        respond(AgentKind::CaregiverCoordination, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_important_message_escalates_with_high_priority() {
        let store = InMemoryStore::new();
        let agent = CaregiverCoordinationAgent::new(
            "caregiver-coordination",
            "Caregiver Coordination Agent",
            "llama2",
            Arc::new(store.connect()),
        );
        agent.initialize().await.unwrap();

        let response = agent
            .process(AgentRequest::new(
                "send_message",
                json!({ "sender": "Dr. Rao", "content": "Please call back", "important": true }),
            ))
            .await;
        let data = response.data.unwrap();
        assert_eq!(data[ESCALATION_KEY]["type"], "caregiver_message");
        assert_eq!(data[ESCALATION_KEY]["priority"], "high");
        assert_eq!(store.row_count("messages").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_process_after_shutdown_fails() {
        let store = InMemoryStore::new();
        let agent = CaregiverCoordinationAgent::new(
            "caregiver-coordination",
            "Caregiver Coordination Agent",
            "llama2",
            Arc::new(store.connect()),
        );
        agent.initialize().await.unwrap();
        agent.shutdown().await.unwrap();

        let response = agent
            .process(AgentRequest::new(
                "send_message",
                json!({ "sender": "Meera", "content": "Lunch?" }),
            ))
            .await;
        assert!(!response.success);
    }
}
