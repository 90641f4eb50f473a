use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{decode, guarded, respond, Agent, AgentCore, ESCALATION_KEY};
use crate::error::{OrchestrationError, Result};
use crate::models::{self, ActivitySample};
use crate::providers::TextGenerator;
use crate::storage::PersistenceStore;
use crate::types::payload::SafetyAlertPayload;
use crate::types::{AgentKind, AgentRequest, AgentResponse, Priority};

const TABLES: &[&str] = &["activity_samples"];
const SYSTEM_PROMPT: &str =
    "You are a safety and activity agent. Watch movement data for falls and unusual inactivity.";

pub struct SafetyActivityAgent {
    core: AgentCore,
}

impl SafetyActivityAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let core = AgentCore::new(AgentKind::SafetyActivity, id, name, model, store)
            .with_tables(TABLES)
            .with_system_prompt(SYSTEM_PROMPT);
        Self { core }
    }

    pub fn with_generator(self, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            core: self.core.with_generator(generator),
        }
    }

    async fn process_sample(&self, request: &AgentRequest) -> Result<Value> {
        let sample: ActivitySample = decode(request)?;
        let assessment = models::detect_fall(&sample);

        self.core
            .record(
                "activity_samples",
                json!({ "sample": request.data, "fallDetected": assessment.fall_detected }),
            )
            .await?;

        if !assessment.fall_detected {
            return Ok(json!({ "assessment": assessment }));
        }

        let message = match &sample.location {
            Some(location) => format!("Possible fall detected in {}", location),
            None => "Possible fall detected".to_string(),
        };
        log::warn!("{}: {}", self.core.name(), message);

        let payload = SafetyAlertPayload {
            severity: Some("high".to_string()),
            message,
        };
        let escalation = AgentRequest::new("safety_alert", json!(payload))
            .with_source(AgentKind::SafetyActivity)
            .with_priority(Priority::Critical);
        Ok(json!({ "assessment": assessment, ESCALATION_KEY: escalation }))
    }
}

#[async_trait]
impl Agent for SafetyActivityAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, request: AgentRequest) -> AgentResponse {
        log::debug!("{} processing {}", self.core.name(), request.request_type);
        let outcome = guarded(&request.request_type, async {
            match request.request_type.as_str() {
                "activity_sample" => self.process_sample(&request).await,
                other => Err(OrchestrationError::UnknownRequestType(other.to_string())),
            }
        })
        .await;
        respond(AgentKind::SafetyActivity, outcome)
    }
}
