use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AgentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Info,
    Warning,
    Critical,
}

impl AlertType {
    pub fn as_str(&self) -> &str {
        match self {
            AlertType::Info => "info",
            AlertType::Warning => "warning",
            AlertType::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub source: AgentKind,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Alert {
    /// Creates an unacknowledged alert whose id is `<category>_<uuid>`.
    pub fn new(
        category: &str,
        alert_type: AlertType,
        message: impl Into<String>,
        source: AgentKind,
    ) -> Self {
        Self {
            id: format!("{}_{}", category, uuid::Uuid::new_v4().simple()),
            alert_type,
            message: message.into(),
            source,
            timestamp: Utc::now(),
            acknowledged: false,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Query over the alert log. All set fields must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertFilter {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<AlertType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AgentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    // Zero is treated as "no limit"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.alert_type.map_or(true, |t| t == alert.alert_type)
            && self.source.map_or(true, |s| s == alert.source)
            && self.acknowledged.map_or(true, |a| a == alert.acknowledged)
    }

    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }
}
