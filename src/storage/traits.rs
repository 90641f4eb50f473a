use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Statement-oriented persistence contract consumed by agents.
///
/// Rows are JSON objects; the core never depends on a specific engine.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn query(&self, statement: &str, params: &[Value]) -> Result<Vec<Value>>;
    async fn exec(&self, statement: &str, params: &[Value]) -> Result<()>;

    /// Releases the handle. Closing twice is not an error.
    async fn close(&self) -> Result<()>;
}

/// Opens a fresh persistence handle for each agent.
pub type StoreFactory = Arc<dyn Fn() -> Arc<dyn PersistenceStore> + Send + Sync>;
