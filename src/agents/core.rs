use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{OrchestrationError, Result};
use crate::lifecycle::{AgentStateMachine, LifecycleEvent};
use crate::providers::{GenerationRequest, TextGenerator};
use crate::storage::PersistenceStore;
use crate::types::{AgentId, AgentKind, AgentSnapshot, AgentStatus};

/// State shared by every agent: identity, lifecycle status, its private
/// persistence handle and an optional text generator used for warm-up.
pub struct AgentCore {
    id: AgentId,
    kind: AgentKind,
    name: String,
    model: String,
    status: Mutex<AgentStatus>,
    store: Arc<dyn PersistenceStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    tables: &'static [&'static str],
    system_prompt: &'static str,
}

impl AgentCore {
    pub fn new(
        kind: AgentKind,
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            model: model.into(),
            status: Mutex::new(AgentStatus::Inactive),
            store,
            generator: None,
            tables: &[],
            system_prompt: "",
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_tables(mut self, tables: &'static [&'static str]) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &'static str) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn store(&self) -> &dyn PersistenceStore {
        self.store.as_ref()
    }

    pub async fn status(&self) -> AgentStatus {
        *self.status.lock().await
    }

    pub async fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            name: self.name.clone(),
            model: self.model.clone(),
            status: self.status().await,
        }
    }

    /// Prepares storage, warms up the model and marks the agent active.
    ///
    /// Storage failures abort initialization. A failed warm-up is only logged:
    /// the generator is optional at runtime.
    pub async fn initialize(&self) -> Result<()> {
        log::info!("Initializing {}...", self.name);

        if self.status().await != AgentStatus::Inactive {
            log::debug!("{} already initialized", self.name);
            return Ok(());
        }

        for table in self.tables {
            self.store
                .exec(&format!("CREATE TABLE IF NOT EXISTS {}", table), &[])
                .await
                .map_err(|e| self.init_failure(e))?;
        }

        if let Some(generator) = &self.generator {
            let request = GenerationRequest::new(
                self.model.clone(),
                format!("Initialize {} and respond with 'Ready.'", self.name),
            )
            .with_system(self.system_prompt);

            if let Err(e) = generator.generate(request).await {
                log::warn!("Error initializing LLM for {}: {}", self.name, e);
            }
        }

        self.apply(LifecycleEvent::Initialized)
            .await
            .map_err(|e| self.init_failure(e))?;
        log::info!("{} initialized successfully", self.name);
        Ok(())
    }

    /// Marks the agent inactive and releases its store. The status change
    /// happens even when closing the store fails.
    pub async fn shutdown(&self) -> Result<()> {
        log::info!("Shutting down {}...", self.name);
        self.apply(LifecycleEvent::ShutDown).await?;

        self.store
            .close()
            .await
            .map_err(|e| OrchestrationError::ShutdownFailure {
                agent_id: self.id.clone(),
                reason: e.to_string(),
            })
    }

    /// Active agents move to `warning`; any other status is left as is.
    pub async fn report_anomaly(&self) {
        self.apply_if_allowed(LifecycleEvent::AnomalyReported).await;
    }

    pub async fn report_fault(&self) {
        self.apply_if_allowed(LifecycleEvent::FaultReported).await;
    }

    pub async fn clear_status(&self) {
        self.apply_if_allowed(LifecycleEvent::StatusCleared).await;
    }

    /// Appends one row to `table` in the agent's store. A store failure puts
    /// an active agent into `error`.
    pub async fn record(&self, table: &str, row: Value) -> Result<()> {
        if let Err(e) = self
            .store
            .exec(&format!("INSERT INTO {}", table), &[row])
            .await
        {
            log::error!("{} could not write to {}: {}", self.name, table, e);
            self.report_fault().await;
            return Err(OrchestrationError::HandlerFault(e.to_string()));
        }
        Ok(())
    }

    pub async fn apply(&self, event: LifecycleEvent) -> Result<AgentStatus> {
        let mut status = self.status.lock().await;
        let next = AgentStateMachine::transition(*status, event)?;
        if next != *status {
            log::debug!("{}: {} -> {}", self.name, *status, next);
        }
        *status = next;
        Ok(next)
    }

    async fn apply_if_allowed(&self, event: LifecycleEvent) {
        let mut status = self.status.lock().await;
        if let Ok(next) = AgentStateMachine::transition(*status, event) {
            *status = next;
        }
    }

    fn init_failure(&self, err: impl ToString) -> OrchestrationError {
        OrchestrationError::InitializationFailure {
            agent_id: self.id.clone(),
            reason: err.to_string(),
        }
    }
}
