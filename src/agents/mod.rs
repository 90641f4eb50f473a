pub mod caregiver;
pub mod core;
pub mod health;
pub mod orchestrator;
pub mod reminder;
pub mod safety;
pub mod social;

pub use self::core::AgentCore;
pub use caregiver::CaregiverCoordinationAgent;
pub use health::HealthMonitoringAgent;
pub use orchestrator::OrchestratorAgent;
pub use reminder::ReminderScheduleAgent;
pub use safety::SafetyActivityAgent;
pub use social::SocialEngagementAgent;

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::error::{OrchestrationError, Result};
use crate::types::{AgentKind, AgentRequest, AgentResponse, AgentSnapshot, AgentStatus};

/// Key under which a worker response carries a request for the orchestrator.
pub const ESCALATION_KEY: &str = "escalation";

/// Key under which the registry attaches the orchestrator's answer to an
/// escalation.
pub const ESCALATION_RESULT_KEY: &str = "escalationResult";

/// Contract every agent fulfils.
///
/// `process` never fails: handler errors are rendered into a failed
/// `AgentResponse`. Lifecycle operations report errors to the caller.
#[async_trait]
pub trait Agent: Send + Sync {
    fn core(&self) -> &AgentCore;

    async fn process(&self, request: AgentRequest) -> AgentResponse;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn kind(&self) -> AgentKind {
        self.core().kind()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn model(&self) -> &str {
        self.core().model()
    }

    async fn status(&self) -> AgentStatus {
        self.core().status().await
    }

    async fn snapshot(&self) -> AgentSnapshot {
        self.core().snapshot().await
    }

    async fn initialize(&self) -> Result<()> {
        self.core().initialize().await
    }

    async fn shutdown(&self) -> Result<()> {
        self.core().shutdown().await
    }
}

/// Closed set of agent variants held by the registry.
pub enum AgentHandle {
    Orchestrator(OrchestratorAgent),
    HealthMonitoring(HealthMonitoringAgent),
    SafetyActivity(SafetyActivityAgent),
    ReminderSchedule(ReminderScheduleAgent),
    CaregiverCoordination(CaregiverCoordinationAgent),
    SocialEngagement(SocialEngagementAgent),
}

macro_rules! each_variant {
    ($handle:expr, $agent:ident => $body:expr) => {
        match $handle {
            AgentHandle::Orchestrator($agent) => $body,
            AgentHandle::HealthMonitoring($agent) => $body,
            AgentHandle::SafetyActivity($agent) => $body,
            AgentHandle::ReminderSchedule($agent) => $body,
            AgentHandle::CaregiverCoordination($agent) => $body,
            AgentHandle::SocialEngagement($agent) => $body,
        }
    };
}

impl AgentHandle {
    pub fn as_orchestrator(&self) -> Option<&OrchestratorAgent> {
        match self {
            AgentHandle::Orchestrator(orchestrator) => Some(orchestrator),
            _ => None,
        }
    }
}

#[async_trait]
impl Agent for AgentHandle {
    fn core(&self) -> &AgentCore {
        each_variant!(self, agent => agent.core())
    }

    async fn process(&self, request: AgentRequest) -> AgentResponse {
        each_variant!(self, agent => agent.process(request).await)
    }

    async fn initialize(&self) -> Result<()> {
        each_variant!(self, agent => agent.initialize().await)
    }

    async fn shutdown(&self) -> Result<()> {
        each_variant!(self, agent => agent.shutdown().await)
    }
}

impl From<OrchestratorAgent> for AgentHandle {
    fn from(agent: OrchestratorAgent) -> Self {
        AgentHandle::Orchestrator(agent)
    }
}

impl From<HealthMonitoringAgent> for AgentHandle {
    fn from(agent: HealthMonitoringAgent) -> Self {
        AgentHandle::HealthMonitoring(agent)
    }
}

impl From<SafetyActivityAgent> for AgentHandle {
    fn from(agent: SafetyActivityAgent) -> Self {
        AgentHandle::SafetyActivity(agent)
    }
}

impl From<ReminderScheduleAgent> for AgentHandle {
    fn from(agent: ReminderScheduleAgent) -> Self {
        AgentHandle::ReminderSchedule(agent)
    }
}

impl From<CaregiverCoordinationAgent> for AgentHandle {
    fn from(agent: CaregiverCoordinationAgent) -> Self {
        AgentHandle::CaregiverCoordination(agent)
    }
}

impl From<SocialEngagementAgent> for AgentHandle {
    fn from(agent: SocialEngagementAgent) -> Self {
        AgentHandle::SocialEngagement(agent)
    }
}

/// Decodes a request's payload into its typed form.
pub(crate) fn decode<T: DeserializeOwned>(request: &AgentRequest) -> Result<T> {
    serde_json::from_value(request.data.clone()).map_err(|e| OrchestrationError::InvalidPayload {
        request_type: request.request_type.clone(),
        reason: e.to_string(),
    })
}

/// Runs a request handler, turning a panic into a `HandlerFault`.
pub(crate) async fn guarded<F>(request_type: &str, handler: F) -> Result<Value>
where
    F: Future<Output = Result<Value>>,
{
    AssertUnwindSafe(handler)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            Err(OrchestrationError::HandlerFault(format!(
                "handler for {} panicked",
                request_type
            )))
        })
}

/// Renders a handler outcome as a response.
pub(crate) fn respond(source: AgentKind, outcome: Result<Value>) -> AgentResponse {
    match outcome {
        Ok(data) => AgentResponse::ok(source, data),
        Err(e) => {
            log::error!("{} failed to process request: {}", source, e);
            AgentResponse::failure(source, e)
        }
    }
}
