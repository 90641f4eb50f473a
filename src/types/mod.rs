pub mod alert;
pub mod payload;
pub mod request;

pub use alert::{Alert, AlertFilter, AlertType};
pub use request::{AgentRequest, AgentResponse, Priority};

use serde::{Deserialize, Serialize};
use std::fmt;

pub type AgentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    HealthMonitoring,
    SafetyActivity,
    ReminderSchedule,
    CaregiverCoordination,
    SocialEngagement,
    #[serde(rename = "central-orchestration", alias = "orchestrator")]
    Orchestrator,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::HealthMonitoring => "health-monitoring",
            AgentKind::SafetyActivity => "safety-activity",
            AgentKind::ReminderSchedule => "reminder-schedule",
            AgentKind::CaregiverCoordination => "caregiver-coordination",
            AgentKind::SocialEngagement => "social-engagement",
            AgentKind::Orchestrator => "central-orchestration",
        }
    }

    pub fn is_orchestrator(&self) -> bool {
        matches!(self, AgentKind::Orchestrator)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Inactive, // Not initialized, or shut down
    Active,   // Initialized and healthy
    Warning,  // Self-reported anomaly
    Error,    // Self-reported fault
}

impl AgentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentStatus::Inactive => "inactive",
            AgentStatus::Active => "active",
            AgentStatus::Warning => "warning",
            AgentStatus::Error => "error",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a registered agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub kind: AgentKind,
    pub name: String,
    pub model: String,
    pub status: AgentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_serialization() {
        let json = serde_json::to_string(&AgentKind::SafetyActivity).unwrap();
        assert_eq!(json, "\"safety-activity\"");

        let json = serde_json::to_string(&AgentKind::Orchestrator).unwrap();
        assert_eq!(json, "\"central-orchestration\"");

        let kind: AgentKind = serde_json::from_str("\"orchestrator\"").unwrap();
        assert_eq!(kind, AgentKind::Orchestrator);
    }

    #[test]
    fn test_agent_status_round_trip_names() {
        let status: AgentStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, AgentStatus::Error);
        assert_eq!(status.to_string(), "error");
    }
}
