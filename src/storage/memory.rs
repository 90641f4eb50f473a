use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, RwLock};

use super::traits::{PersistenceStore, StoreFactory};

static INSERT_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*insert\s+into\s+(\w+)").expect("valid insert pattern"));
static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*create\s+table\s+(?:if\s+not\s+exists\s+)?(\w+)")
        .expect("valid create pattern")
});
static FROM_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+(\w+)").expect("valid select pattern"));

#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub statement: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct Database {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    journal: RwLock<Vec<JournalEntry>>,
}

/// In-process store. Handles opened with [`InMemoryStore::connect`] share
/// tables but close independently.
///
/// `INSERT INTO <table>` appends a row built from the params, `CREATE TABLE`
/// creates an empty table and `SELECT ... FROM <table>` returns every row.
/// All other statements are only journaled.
#[derive(Clone)]
pub struct InMemoryStore {
    db: Arc<Database>,
    closed: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            db: Arc::new(Database::default()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn connect(&self) -> Self {
        Self {
            db: self.db.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn factory(&self) -> StoreFactory {
        let root = self.clone();
        Arc::new(move || Arc::new(root.connect()) as Arc<dyn PersistenceStore>)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn journal(&self) -> Result<Vec<JournalEntry>> {
        let journal = self
            .db
            .journal
            .read()
            .map_err(|_| anyhow!("journal lock poisoned"))?;
        Ok(journal.clone())
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        let tables = self
            .db
            .tables
            .read()
            .map_err(|_| anyhow!("table lock poisoned"))?;
        Ok(tables.get(table).map_or(0, Vec::len))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(anyhow!("Persistence handle is closed"));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn row_from_params(params: &[Value]) -> Value {
    match params {
        [row @ Value::Object(_)] => row.clone(),
        _ => json!({ "values": params }),
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn query(&self, statement: &str, _params: &[Value]) -> Result<Vec<Value>> {
        self.ensure_open()?;

        let table = FROM_TABLE
            .captures(statement)
            .and_then(|c| c.get(1))
            .ok_or_else(|| anyhow!("Unsupported query: {}", statement))?;

        let tables = self
            .db
            .tables
            .read()
            .map_err(|_| anyhow!("table lock poisoned"))?;
        Ok(tables.get(table.as_str()).cloned().unwrap_or_default())
    }

    async fn exec(&self, statement: &str, params: &[Value]) -> Result<()> {
        self.ensure_open()?;

        {
            let mut tables = self
                .db
                .tables
                .write()
                .map_err(|_| anyhow!("table lock poisoned"))?;

            if let Some(table) = INSERT_TABLE.captures(statement).and_then(|c| c.get(1)) {
                tables
                    .entry(table.as_str().to_string())
                    .or_default()
                    .push(row_from_params(params));
            } else if let Some(table) = CREATE_TABLE.captures(statement).and_then(|c| c.get(1)) {
                tables.entry(table.as_str().to_string()).or_default();
            }
        }

        let mut journal = self
            .db
            .journal
            .write()
            .map_err(|_| anyhow!("journal lock poisoned"))?;
        journal.push(JournalEntry {
            statement: statement.to_string(),
            params: params.to_vec(),
        });

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::debug!("Closing in-memory persistence handle");
        }
        Ok(())
    }
}
