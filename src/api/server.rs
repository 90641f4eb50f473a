use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::engine::AgentRegistry;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/agents", get(handlers::list_agents))
        .route("/agents/:id/requests", post(handlers::dispatch_to_agent))
        .route("/requests", post(handlers::submit_request))
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/:id/acknowledge", post(handlers::acknowledge_alert))
        .route("/events", get(handlers::stream_events))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log::info!("SevaSahayak API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
