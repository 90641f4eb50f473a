use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, Result};
use crate::types::AgentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Initialized,
    AnomalyReported,
    FaultReported,
    StatusCleared,
    ShutDown,
}

pub struct AgentStateMachine;

impl AgentStateMachine {
    pub fn transition(current: AgentStatus, event: LifecycleEvent) -> Result<AgentStatus> {
        let next = match (current, event) {
            (AgentStatus::Inactive, LifecycleEvent::Initialized) => AgentStatus::Active,
            (AgentStatus::Active, LifecycleEvent::AnomalyReported) => AgentStatus::Warning,
            (AgentStatus::Active, LifecycleEvent::FaultReported) => AgentStatus::Error,

            // Leaving a degraded status needs an explicit update
            (AgentStatus::Warning | AgentStatus::Error, LifecycleEvent::StatusCleared) => {
                AgentStatus::Active
            }

            (_, LifecycleEvent::ShutDown) => AgentStatus::Inactive,

            _ => {
                return Err(OrchestrationError::InvalidTransition {
                    from: current.to_string(),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }

    pub fn can_transition(current: AgentStatus, event: LifecycleEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
