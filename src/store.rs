use rand::Rng;
use rand::distributions::Alphanumeric;
use rusqlite::{Connection, params};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::models::RawRecord;

const ID_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("could not encode document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("database not initialized. Run 'jobboard init' first.")]
    NotInitialized,
}

/// Fetch-all / insert-one over untyped documents.
pub trait DocumentStore {
    fn fetch_all(&self) -> Result<Vec<(String, RawRecord)>, StoreError>;
    fn insert(&self, payload: &RawRecord) -> Result<String, StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
    collection: String,
}

impl SqliteStore {
    pub fn open(path: &Path, collection: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), collection, "opened document store");
        Ok(Self {
            conn,
            collection: collection.to_string(),
        })
    }

    pub fn open_in_memory(collection: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            collection: collection.to_string(),
        })
    }

    pub fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                inserted_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<(), StoreError> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(StoreError::NotInitialized);
        }
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn fetch_all(&self) -> Result<Vec<(String, RawRecord)>, StoreError> {
        self.ensure_initialized()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map([&self.collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, body) = row?;
            documents.push((id.clone(), decode_body(&id, &body)));
        }
        tracing::debug!(count = documents.len(), collection = %self.collection, "fetched documents");
        Ok(documents)
    }

    fn insert(&self, payload: &RawRecord) -> Result<String, StoreError> {
        self.ensure_initialized()?;
        let body = serde_json::to_string(payload)?;
        let id = generate_id();
        self.conn.execute(
            "INSERT INTO documents (id, collection, body) VALUES (?1, ?2, ?3)",
            params![id, self.collection, body],
        )?;
        tracing::info!(%id, collection = %self.collection, "inserted document");
        Ok(id)
    }
}

fn decode_body(id: &str, body: &str) -> RawRecord {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(%id, kind = json_kind(&other), "document body is not an object");
            RawRecord::new()
        }
        Err(e) => {
            tracing::warn!(%id, error = %e, "document body is not valid JSON");
            RawRecord::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}
