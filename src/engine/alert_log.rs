use std::collections::VecDeque;

use crate::types::{Alert, AlertFilter};

pub const DEFAULT_ALERT_CAPACITY: usize = 100;

/// Bounded, append-only log of recent alerts. The oldest entry is evicted
/// once the capacity is exceeded.
#[derive(Debug)]
pub struct AlertLog {
    entries: VecDeque<Alert>,
    capacity: usize,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, alert: Alert) {
        log::info!(
            "Alert created: {} - {}",
            alert.alert_type.as_str(),
            alert.message
        );
        self.entries.push_back(alert);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Matching alerts, newest first, truncated to the filter's limit.
    pub fn query(&self, filter: &AlertFilter) -> Vec<Alert> {
        // Reverse insertion order first so equal timestamps stay newest-first
        let mut alerts: Vec<Alert> = self
            .entries
            .iter()
            .rev()
            .filter(|alert| filter.matches(alert))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if let Some(limit) = filter.effective_limit() {
            alerts.truncate(limit);
        }
        alerts
    }

    pub fn acknowledge(&mut self, id: &str) -> Option<Alert> {
        let alert = self.entries.iter_mut().find(|alert| alert.id == id)?;
        alert.acknowledged = true;
        Some(alert.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}
