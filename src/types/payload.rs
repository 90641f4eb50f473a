//! Typed request payloads. Field names follow the camelCase wire shape.

use serde::{Deserialize, Serialize};

use super::AgentStatus;
use crate::models::HealthReading;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAlertPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    pub message: String,
}

impl SafetyAlertPayload {
    pub fn is_high_severity(&self) -> bool {
        self.severity.as_deref() == Some("high")
    }
}

// The four notification payloads below are lenient: absent fields decode
// to empty strings so a partial notice is still delivered.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationReminderPayload {
    #[serde(default)]
    pub medication_name: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaregiverMessagePayload {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub important: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialActivityPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusUpdatePayload {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub status: ReportedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Status as reported by another agent. Values outside the lifecycle
/// vocabulary are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportedStatus {
    Known(AgentStatus),
    Other(String),
}

impl ReportedStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, ReportedStatus::Known(AgentStatus::Error))
    }
}

impl Default for ReportedStatus {
    fn default() -> Self {
        ReportedStatus::Other("unknown".to_string())
    }
}

impl From<AgentStatus> for ReportedStatus {
    fn from(status: AgentStatus) -> Self {
        ReportedStatus::Known(status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeAlertPayload {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthHistoryPayload {
    pub history: Vec<HealthReading>,
}
