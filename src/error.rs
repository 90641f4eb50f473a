use thiserror::Error;

/// Errors surfaced by the orchestration core.
///
/// Handler-level variants (`UnknownRequestType`, `HandlerFault`, `InvalidPayload`,
/// `Timeout`) never escape `process`: they are rendered into a failed
/// `AgentResponse`. Lifecycle variants are collected per agent.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("No orchestrator agent registered")]
    NoOrchestrator,

    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),

    #[error("Error processing request: {0}")]
    HandlerFault(String),

    #[error("Embedding vectors must have the same dimension ({left} != {right})")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Agent {agent_id} failed to initialize: {reason}")]
    InitializationFailure { agent_id: String, reason: String },

    #[error("Agent {agent_id} failed to shut down: {reason}")]
    ShutdownFailure { agent_id: String, reason: String },

    #[error("Orchestrator {existing} already registered, rejected {rejected}")]
    DuplicateOrchestrator { existing: String, rejected: String },

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Invalid payload for {request_type}: {reason}")]
    InvalidPayload { request_type: String, reason: String },

    #[error("Request {request_type} timed out after {millis}ms")]
    Timeout { request_type: String, millis: u128 },

    #[error("Invalid status transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

pub type Result<T> = std::result::Result<T, OrchestrationError>;
