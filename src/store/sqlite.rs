//! SQLite-backed state store.
//!
//! Each top-level key is one row holding its JSON value, so the persisted
//! layout matches what the extension keeps in its own local storage.

use super::{StateKey, StateRecord, StateStore, StoreError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

pub struct SqliteStore {
    db_path: String,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database and makes sure the schema exists.
    pub fn open(db_path: impl Into<String>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let store = Self {
            db_path,
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS state_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        info!("SQLite state store initialized at {}", self.db_path);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
    }

    fn read(&self, keys: &[StateKey]) -> Result<StateRecord, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT value FROM state_entries WHERE key = ?1")?;

        let mut record = StateRecord::default();
        for key in keys {
            let raw: Option<String> = stmt
                .query_row(params![key.as_str()], |row| row.get(0))
                .optional()?;
            let Some(raw) = raw else {
                continue;
            };
            match key {
                StateKey::BlockedDomains => {
                    record.blocked_domains = Some(serde_json::from_str(&raw)?)
                }
                StateKey::BlockPrompts => record.block_prompts = Some(serde_json::from_str(&raw)?),
                StateKey::Counters => record.counters = Some(serde_json::from_str(&raw)?),
            }
        }
        Ok(record)
    }

    fn write(&self, record: &StateRecord) -> Result<(), StoreError> {
        let mut entries = Vec::new();
        if let Some(domains) = &record.blocked_domains {
            entries.push((StateKey::BlockedDomains, serde_json::to_string(domains)?));
        }
        if let Some(prompts) = &record.block_prompts {
            entries.push((StateKey::BlockPrompts, serde_json::to_string(prompts)?));
        }
        if let Some(counters) = &record.counters {
            entries.push((StateKey::Counters, serde_json::to_string(counters)?));
        }
        if entries.is_empty() {
            return Ok(());
        }

        let timestamp = chrono::Utc::now().timestamp();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO state_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )?;
            for (key, value) in &entries {
                stmt.execute(params![key.as_str(), value, timestamp])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get(&self, keys: &[StateKey]) -> Result<StateRecord, StoreError> {
        self.read(keys)
    }

    async fn set(&self, record: StateRecord) -> Result<(), StoreError> {
        self.write(&record)
    }
}
