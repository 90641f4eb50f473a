use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

use super::{decode, guarded, respond, Agent, AgentCore};
use crate::engine::alert_log::{AlertLog, DEFAULT_ALERT_CAPACITY};
use crate::engine::queue::PriorityQueue;
use crate::error::{OrchestrationError, Result};
use crate::models::{self, HealthReading};
use crate::storage::PersistenceStore;
use crate::types::payload::{
    AcknowledgeAlertPayload, AgentStatusUpdatePayload, CaregiverMessagePayload,
    MedicationReminderPayload, ReportedStatus, SafetyAlertPayload, SocialActivityPayload,
};
use crate::types::{AgentId, AgentKind, AgentRequest, AgentResponse, Alert, AlertFilter, AlertType};

const SYSTEM_PROMPT: &str = "You are the central orchestration agent for an elderly care system.";
const MESSAGE_PREVIEW_CHARS: usize = 50;

struct PendingRequest {
    request: AgentRequest,
    reply: oneshot::Sender<AgentResponse>,
}

/// Everything guarded by the dispatch lock.
struct OrchestratorState {
    alerts: AlertLog,
    statuses: HashMap<AgentId, ReportedStatus>,
}

/// Central routing agent. Requests are queued by priority and dispatched one
/// at a time; the alert log and status map are only touched while the
/// dispatch lock is held.
pub struct OrchestratorAgent {
    core: AgentCore,
    queue: Mutex<PriorityQueue<PendingRequest>>,
    state: Mutex<OrchestratorState>,
}

impl OrchestratorAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let core = AgentCore::new(AgentKind::Orchestrator, id, name, model, store)
            .with_system_prompt(SYSTEM_PROMPT);
        Self::from_core(core, DEFAULT_ALERT_CAPACITY)
    }

    pub fn from_core(core: AgentCore, alert_capacity: usize) -> Self {
        Self {
            core,
            queue: Mutex::new(PriorityQueue::new()),
            state: Mutex::new(OrchestratorState {
                alerts: AlertLog::new(alert_capacity),
                statuses: HashMap::new(),
            }),
        }
    }

    pub fn with_alert_capacity(self, alert_capacity: usize) -> Self {
        Self::from_core(self.core, alert_capacity)
    }

    pub fn with_generator(self, generator: Arc<dyn crate::providers::TextGenerator>) -> Self {
        Self {
            core: self.core.with_generator(generator),
            ..self
        }
    }

    pub async fn create_alert(&self, alert: Alert) {
        self.state.lock().await.alerts.push(alert);
    }

    /// Newest-first view of the alert log.
    pub async fn alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.state.lock().await.alerts.query(filter)
    }

    pub async fn acknowledge_alert(&self, id: &str) -> Option<Alert> {
        self.state.lock().await.alerts.acknowledge(id)
    }

    pub async fn agent_statuses(&self) -> HashMap<AgentId, ReportedStatus> {
        self.state.lock().await.statuses.clone()
    }

    /// Requests waiting for the dispatch lock, in the order they will be served.
    pub async fn pending_requests(&self) -> Vec<AgentRequest> {
        self.queue
            .lock()
            .await
            .iter()
            .map(|pending| pending.request.clone())
            .collect()
    }

    async fn enqueue(&self, mut request: AgentRequest) -> oneshot::Receiver<AgentResponse> {
        request.fill_defaults();
        let (reply, rx) = oneshot::channel();
        let priority = request.effective_priority();
        self.queue
            .lock()
            .await
            .push(priority, PendingRequest { request, reply });
        rx
    }

    /// Serves queued requests until the queue is empty. Must be called with
    /// the dispatch lock held.
    async fn drain(&self, state: &mut OrchestratorState) {
        loop {
            let next = self.queue.lock().await.pop();
            let Some(PendingRequest { request, reply }) = next else {
                break;
            };

            if reply.is_closed() {
                log::debug!(
                    "{} dropping abandoned request: {}",
                    self.core.name(),
                    request.request_type
                );
                continue;
            }

            log::info!(
                "{} processing request: {} ({})",
                self.core.name(),
                request.request_type,
                request.effective_priority().as_str()
            );

            let outcome = guarded(&request.request_type, self.dispatch(state, &request)).await;

            // The caller may have given up waiting
            let _ = reply.send(respond(AgentKind::Orchestrator, outcome));
        }
    }

    async fn dispatch(&self, state: &mut OrchestratorState, request: &AgentRequest) -> Result<Value> {
        match request.request_type.as_str() {
            "health_data" => handle_health_data(state, request),
            "safety_alert" => handle_safety_alert(state, request),
            "medication_reminder" => handle_medication_reminder(state, request),
            "caregiver_message" => handle_caregiver_message(state, request),
            "social_activity" => handle_social_activity(state, request),
            "agent_status_update" => handle_status_update(state, request),
            "get_alerts" => handle_get_alerts(state, request),
            "acknowledge_alert" => handle_acknowledge(state, request),
            other => Err(OrchestrationError::UnknownRequestType(other.to_string())),
        }
    }
}

#[async_trait]
impl Agent for OrchestratorAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, request: AgentRequest) -> AgentResponse {
        let request_type = request.request_type.clone();
        let rx = self.enqueue(request).await;

        {
            let mut state = self.state.lock().await;
            self.drain(&mut state).await;
        }

        rx.await.unwrap_or_else(|_| {
            AgentResponse::failure(
                AgentKind::Orchestrator,
                OrchestrationError::HandlerFault(format!("{} was cancelled", request_type)),
            )
        })
    }
}

fn handle_health_data(state: &mut OrchestratorState, request: &AgentRequest) -> Result<Value> {
    let reading: HealthReading = decode(request)?;
    let result = models::score(&reading);

    if result.is_anomaly {
        let alert = Alert::new(
            "health",
            AlertType::Warning,
            format!("Health anomaly detected: {}", result.details),
            AgentKind::HealthMonitoring,
        )
        .with_data(json!({ "healthData": request.data, "anomalyResult": result }));
        state.alerts.push(alert);
    }

    Ok(json!({
        "processed": true,
        "anomalyDetected": result.is_anomaly,
        "anomalyDetails": result.details,
    }))
}

fn handle_safety_alert(state: &mut OrchestratorState, request: &AgentRequest) -> Result<Value> {
    let payload: SafetyAlertPayload = decode(request)?;
    let alert_type = if payload.is_high_severity() {
        AlertType::Critical
    } else {
        AlertType::Warning
    };

    let alert = Alert::new(
        "safety",
        alert_type,
        payload.message.clone(),
        AgentKind::SafetyActivity,
    )
    .with_data(request.data.clone());
    let alert_id = alert.id.clone();
    state.alerts.push(alert);

    let notification_sent = alert_type == AlertType::Critical;
    if notification_sent {
        log::warn!("CRITICAL SAFETY ALERT: {}", payload.message);
    }

    Ok(json!({
        "alertCreated": true,
        "alertId": alert_id,
        "notificationSent": notification_sent,
    }))
}

fn handle_medication_reminder(
    state: &mut OrchestratorState,
    request: &AgentRequest,
) -> Result<Value> {
    let payload: MedicationReminderPayload = decode(request)?;
    let alert = Alert::new(
        "medication",
        AlertType::Info,
        format!(
            "Medication reminder: {} at {}",
            payload.medication_name, payload.time
        ),
        AgentKind::ReminderSchedule,
    )
    .with_data(request.data.clone());
    state.alerts.push(alert);

    Ok(json!({ "reminderScheduled": true, "reminderTime": payload.time }))
}

fn handle_caregiver_message(
    state: &mut OrchestratorState,
    request: &AgentRequest,
) -> Result<Value> {
    let payload: CaregiverMessagePayload = decode(request)?;

    if payload.important {
        let preview: String = payload.content.chars().take(MESSAGE_PREVIEW_CHARS).collect();
        let alert = Alert::new(
            "message",
            AlertType::Info,
            format!("Important message from {}: {}...", payload.sender, preview),
            AgentKind::CaregiverCoordination,
        )
        .with_data(request.data.clone());
        state.alerts.push(alert);
    }

    Ok(json!({
        "messageDelivered": true,
        "messageId": format!("msg_{}", uuid::Uuid::new_v4().simple()),
    }))
}

fn handle_social_activity(state: &mut OrchestratorState, request: &AgentRequest) -> Result<Value> {
    let payload: SocialActivityPayload = decode(request)?;
    let alert = Alert::new(
        "social",
        AlertType::Info,
        format!("Social activity scheduled: {} at {}", payload.name, payload.time),
        AgentKind::SocialEngagement,
    )
    .with_data(request.data.clone());
    state.alerts.push(alert);

    Ok(json!({ "activityScheduled": true, "activityTime": payload.time }))
}

fn handle_status_update(state: &mut OrchestratorState, request: &AgentRequest) -> Result<Value> {
    let payload: AgentStatusUpdatePayload = decode(request)?;
    state
        .statuses
        .insert(payload.agent_id.clone(), payload.status.clone());

    if payload.status.is_error() {
        let agent_name = payload.agent_name.as_deref().unwrap_or(&payload.agent_id);
        let reason = payload.error_message.as_deref().unwrap_or("unknown error");
        let alert = Alert::new(
            "agent",
            AlertType::Warning,
            format!("Agent {} is reporting an error: {}", agent_name, reason),
            AgentKind::Orchestrator,
        )
        .with_data(request.data.clone());
        state.alerts.push(alert);
    }

    Ok(json!({ "statusUpdated": true, "currentStatus": payload.status }))
}

fn handle_get_alerts(state: &mut OrchestratorState, request: &AgentRequest) -> Result<Value> {
    let filter: AlertFilter = if request.data.is_null() {
        AlertFilter::default()
    } else {
        decode(request)?
    };

    Ok(json!({ "alerts": state.alerts.query(&filter) }))
}

fn handle_acknowledge(state: &mut OrchestratorState, request: &AgentRequest) -> Result<Value> {
    let payload: AcknowledgeAlertPayload = decode(request)?;
    let alert = state
        .alerts
        .acknowledge(&payload.id)
        .ok_or_else(|| OrchestrationError::HandlerFault(format!("Alert not found: {}", payload.id)))?;

    Ok(json!({ "acknowledged": true, "alert": alert }))
}
