//! Persisted state shared by the engine and every settings surface.
//!
//! The store is a small key-value service: callers ask for a subset of keys
//! and get back a partial [`StateRecord`]; writes merge the fields that are
//! present and leave the others untouched.

mod memory;
mod sqlite;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Keys understood by every [`StateStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    BlockedDomains,
    BlockPrompts,
    Counters,
}

impl StateKey {
    pub const ALL: [StateKey; 3] = [
        StateKey::BlockedDomains,
        StateKey::BlockPrompts,
        StateKey::Counters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::BlockedDomains => "blockedDomains",
            StateKey::BlockPrompts => "blockPrompts",
            StateKey::Counters => "counters",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// Visit count for one domain, valid only for `date` (YYYY-MM-DD).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounter {
    pub count: u64,
    pub date: String,
}

impl DayCounter {
    pub fn fresh(date: &str) -> Self {
        Self {
            count: 0,
            date: date.to_string(),
        }
    }
}

pub type Counters = BTreeMap<String, DayCounter>;

/// A partial view of the persisted state. `None` means "not requested" on
/// reads and "leave unchanged" on writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_prompts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<Counters>,
}

impl StateRecord {
    pub fn with_blocked_domains(domains: Vec<String>) -> Self {
        Self {
            blocked_domains: Some(domains),
            ..Default::default()
        }
    }

    pub fn with_block_prompts(prompts: Vec<String>) -> Self {
        Self {
            block_prompts: Some(prompts),
            ..Default::default()
        }
    }

    pub fn with_counters(counters: Counters) -> Self {
        Self {
            counters: Some(counters),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocked_domains.is_none() && self.block_prompts.is_none() && self.counters.is_none()
    }

    pub fn has(&self, key: StateKey) -> bool {
        match key {
            StateKey::BlockedDomains => self.blocked_domains.is_some(),
            StateKey::BlockPrompts => self.block_prompts.is_some(),
            StateKey::Counters => self.counters.is_some(),
        }
    }

    /// Overwrites every field that is present in `other`.
    pub fn merge(&mut self, other: StateRecord) {
        if let Some(domains) = other.blocked_domains {
            self.blocked_domains = Some(domains);
        }
        if let Some(prompts) = other.block_prompts {
            self.block_prompts = Some(prompts);
        }
        if let Some(counters) = other.counters {
            self.counters = Some(counters);
        }
    }

    /// Copies out only the requested keys.
    pub fn select(&self, keys: &[StateKey]) -> StateRecord {
        let mut out = StateRecord::default();
        for key in keys {
            match key {
                StateKey::BlockedDomains => out.blocked_domains = self.blocked_domains.clone(),
                StateKey::BlockPrompts => out.block_prompts = self.block_prompts.clone(),
                StateKey::Counters => out.counters = self.counters.clone(),
            }
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored value is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Async key-value access to the persisted state.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, keys: &[StateKey]) -> Result<StateRecord, StoreError>;
    async fn set(&self, record: StateRecord) -> Result<(), StoreError>;
}

/// Writes the default domain and prompt lists for keys that are not present
/// yet. Returns what was written; an empty record means nothing changed.
pub async fn seed_defaults(
    store: &dyn StateStore,
    blocked_domains: &[String],
    prompts: &[String],
) -> Result<StateRecord, StoreError> {
    let current = store
        .get(&[StateKey::BlockedDomains, StateKey::BlockPrompts])
        .await?;

    let mut updates = StateRecord::default();
    if current.blocked_domains.is_none() {
        updates.blocked_domains = Some(blocked_domains.to_vec());
    }
    if current.block_prompts.is_none() {
        updates.block_prompts = Some(prompts.to_vec());
    }

    if !updates.is_empty() {
        info!(
            "Seeding defaults (domains: {}, prompts: {})",
            updates.blocked_domains.is_some(),
            updates.block_prompts.is_some()
        );
        store.set(updates.clone()).await?;
    }
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_storage_key_names() {
        let mut counters = Counters::new();
        counters.insert(
            "reddit.com".to_string(),
            DayCounter {
                count: 2,
                date: "2024-01-01".to_string(),
            },
        );
        let record = StateRecord {
            blocked_domains: Some(vec!["reddit.com".to_string()]),
            block_prompts: None,
            counters: Some(counters),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["blockedDomains"][0], "reddit.com");
        assert_eq!(json["counters"]["reddit.com"]["count"], 2);
        assert!(json.get("blockPrompts").is_none());
    }

    #[test]
    fn test_merge_only_touches_present_fields() {
        let mut record = StateRecord {
            blocked_domains: Some(vec!["a.com".to_string()]),
            block_prompts: Some(vec!["Hold on...".to_string()]),
            counters: None,
        };
        record.merge(StateRecord::with_blocked_domains(vec!["b.com".to_string()]));

        assert_eq!(record.blocked_domains, Some(vec!["b.com".to_string()]));
        assert_eq!(record.block_prompts, Some(vec!["Hold on...".to_string()]));
        assert!(record.counters.is_none());
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in StateKey::ALL {
            assert_eq!(StateKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(StateKey::from_name("nope"), None);
    }

    #[tokio::test]
    async fn test_seed_defaults_is_idempotent() {
        let store = MemoryStore::new();
        let domains = vec!["tiktok.com".to_string()];
        let prompts = vec!["Hold on...".to_string()];

        let first = seed_defaults(&store, &domains, &prompts).await.unwrap();
        assert!(first.has(StateKey::BlockedDomains));
        assert!(first.has(StateKey::BlockPrompts));

        store
            .set(StateRecord::with_blocked_domains(vec!["x.com".to_string()]))
            .await
            .unwrap();

        let second = seed_defaults(&store, &domains, &prompts).await.unwrap();
        assert!(second.is_empty());

        let state = store.get(&[StateKey::BlockedDomains]).await.unwrap();
        assert_eq!(state.blocked_domains, Some(vec!["x.com".to_string()]));
    }

    #[tokio::test]
    async fn test_seed_respects_user_emptied_list() {
        let store = MemoryStore::with_state(StateRecord::with_blocked_domains(vec![]));
        let written = seed_defaults(&store, &["a.com".to_string()], &["Hi...".to_string()])
            .await
            .unwrap();

        assert!(written.blocked_domains.is_none());
        assert_eq!(written.block_prompts, Some(vec!["Hi...".to_string()]));
    }
}
