use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AgentKind;

/// Request priority. Ordering follows urgency: `Critical` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AgentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AgentRequest {
    pub fn new(request_type: impl Into<String>, data: Value) -> Self {
        Self {
            request_type: request_type.into(),
            data,
            source: None,
            priority: None,
            timestamp: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_source(mut self, source: AgentKind) -> Self {
        self.source = Some(source);
        self
    }

    /// Fills the enqueue-time defaults: `medium` priority and the current time.
    pub fn fill_defaults(&mut self) {
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now());
        }
        if self.priority.is_none() {
            self.priority = Some(Priority::default());
        }
    }

    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source: AgentKind,
    pub timestamp: DateTime<Utc>,
}

impl AgentResponse {
    pub fn ok(source: AgentKind, data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            source,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(source: AgentKind, error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            source,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_fill_defaults() {
        let mut request = AgentRequest::new("health_data", json!({}));
        assert!(request.priority.is_none());

        request.fill_defaults();
        assert_eq!(request.priority, Some(Priority::Medium));
        assert!(request.timestamp.is_some());
    }

    #[test]
    fn test_fill_defaults_keeps_explicit_values() {
        let mut request =
            AgentRequest::new("safety_alert", json!({})).with_priority(Priority::Critical);
        request.fill_defaults();
        assert_eq!(request.priority, Some(Priority::Critical));
    }

    #[test]
    fn test_request_deserializes_wire_shape() {
        let request: AgentRequest = serde_json::from_value(json!({
            "type": "medication_reminder",
            "data": {"medicationName": "Aspirin", "time": "08:00"},
            "source": "reminder-schedule",
            "priority": "high"
        }))
        .unwrap();

        assert_eq!(request.request_type, "medication_reminder");
        assert_eq!(request.source, Some(AgentKind::ReminderSchedule));
        assert_eq!(request.priority, Some(Priority::High));
        assert!(request.timestamp.is_none());
    }

    #[test]
    fn test_failure_response() {
        let response = AgentResponse::failure(AgentKind::Orchestrator, "boom");
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("boom"));
        assert!(response.data.is_none());
    }
}
