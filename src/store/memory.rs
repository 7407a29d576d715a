use super::{StateKey, StateRecord, StateStore, StoreError};
use async_trait::async_trait;
use std::sync::RwLock;

/// Process-lifetime store. Used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StateRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StateRecord) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, keys: &[StateKey]) -> Result<StateRecord, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(state.select(keys))
    }

    async fn set(&self, record: StateRecord) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        state.merge(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_only_requested_keys() {
        let store = MemoryStore::with_state(StateRecord {
            blocked_domains: Some(vec!["reddit.com".to_string()]),
            block_prompts: Some(vec!["Bruh...".to_string()]),
            counters: None,
        });

        let record = store.get(&[StateKey::BlockPrompts]).await.unwrap();
        assert!(record.blocked_domains.is_none());
        assert_eq!(record.block_prompts, Some(vec!["Bruh...".to_string()]));

        let missing = store.get(&[StateKey::Counters]).await.unwrap();
        assert!(missing.is_empty());
    }
}
