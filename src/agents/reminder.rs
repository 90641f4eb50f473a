use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{decode, guarded, respond, Agent, AgentCore, ESCALATION_KEY};
use crate::error::{OrchestrationError, Result};
use crate::providers::TextGenerator;
use crate::storage::PersistenceStore;
use crate::types::payload::MedicationReminderPayload;
use crate::types::{AgentKind, AgentRequest, AgentResponse};

const TABLES: &[&str] = &["reminders"];
const SYSTEM_PROMPT: &str =
    "You are a reminder and schedule agent. Keep medication and appointment times on track.";

pub struct ReminderScheduleAgent {
    core: AgentCore,
}

impl ReminderScheduleAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let core = AgentCore::new(AgentKind::ReminderSchedule, id, name, model, store)
            .with_tables(TABLES)
            .with_system_prompt(SYSTEM_PROMPT);
        Self { core }
    }

    pub fn with_generator(self, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            core: self.core.with_generator(generator),
        }
    }

    async fn schedule_medication(&self, request: &AgentRequest) -> Result<Value> {
        let reminder: MedicationReminderPayload = decode(request)?;
        self.core.record("reminders", json!(reminder)).await?;

        let escalation = AgentRequest::new("medication_reminder", json!(reminder))
            .with_source(AgentKind::ReminderSchedule);
        Ok(json!({ "scheduled": true, "reminder": reminder, ESCALATION_KEY: escalation }))
    }
}

#[async_trait]
impl Agent for ReminderScheduleAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, request: AgentRequest) -> AgentResponse {
        log::debug!("{} processing {}", self.core.name(), request.request_type);
        let outcome = guarded(&request.request_type, async {
            match request.request_type.as_str() {
                "schedule_medication" => self.schedule_medication(&request).await,
                other => Err(OrchestrationError::UnknownRequestType(other.to_string())),
            }
        })
        .await;
        respond(AgentKind::ReminderSchedule, outcome)
    }
}
