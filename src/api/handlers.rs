use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use std::convert::Infallible;
use tokio_stream::StreamExt;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::engine::AgentRegistry;
use crate::types::{AgentRequest, AgentResponse, AgentSnapshot, Alert, AlertFilter};

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSnapshot>> {
    Json(state.registry.statuses().await)
}

pub async fn submit_request(
    State(state): State<AppState>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    let response = state
        .registry
        .process_with_timeout(request, state.request_timeout)
        .await?;
    Ok(Json(response))
}

pub async fn dispatch_to_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    let response = state.registry.dispatch_to(&agent_id, request).await?;
    Ok(Json(response))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let alerts = orchestrator(&state.registry)?.alerts(&filter).await;
    Ok(Json(alerts))
}

pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> Result<Json<Alert>, ApiError> {
    orchestrator(&state.registry)?
        .acknowledge_alert(&alert_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Alert not found: {}", alert_id)))
}

pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.registry.event_stream().map(|event| {
        Ok(Event::default()
            .event(event.name())
            .data(serde_json::to_string(&event).unwrap_or_default()))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn orchestrator(
    registry: &AgentRegistry,
) -> Result<&crate::agents::OrchestratorAgent, ApiError> {
    registry
        .orchestrator()
        .ok_or_else(|| ApiError::Unavailable("No orchestrator agent registered".to_string()))
}
