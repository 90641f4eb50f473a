use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{decode, guarded, respond, Agent, AgentCore, ESCALATION_KEY};
use crate::error::{OrchestrationError, Result};
use crate::providers::TextGenerator;
use crate::storage::PersistenceStore;
use crate::types::payload::SocialActivityPayload;
use crate::types::{AgentKind, AgentRequest, AgentResponse, Priority};

const TABLES: &[&str] = &["activities"];
const SYSTEM_PROMPT: &str =
    "You are a social engagement agent. Suggest and schedule activities that keep people connected.";

pub struct SocialEngagementAgent {
    core: AgentCore,
}

impl SocialEngagementAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let core = AgentCore::new(AgentKind::SocialEngagement, id, name, model, store)
            .with_tables(TABLES)
            .with_system_prompt(SYSTEM_PROMPT);
        Self { core }
    }

    pub fn with_generator(self, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            core: self.core.with_generator(generator),
        }
    }

    async fn schedule_activity(&self, request: &AgentRequest) -> Result<Value> {
        let activity: SocialActivityPayload = decode(request)?;
        self.core.record("activities", json!(activity)).await?;

        let escalation = AgentRequest::new("social_activity", json!(activity))
            .with_source(AgentKind::SocialEngagement)
            .with_priority(Priority::Low);
        Ok(json!({ "scheduled": true, ESCALATION_KEY: escalation }))
    }
}

#[async_trait]
impl Agent for SocialEngagementAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, request: AgentRequest) -> AgentResponse {
        log::debug!("{} processing {}", self.core.name(), request.request_type);
        let outcome = guarded(&request.request_type, async {
            match request.request_type.as_str() {
                "schedule_activity" => self.schedule_activity(&request).await,
                other => Err(OrchestrationError::UnknownRequestType(other.to_string())),
            }
        })
        .await;
        respond(AgentKind::SocialEngagement, outcome)
    }
}
