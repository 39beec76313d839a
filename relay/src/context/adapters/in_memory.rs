use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::context::store::{ContextBackend, ContextStoreError, ConversationTurn};

/// In-memory implementation of `ContextBackend`.
///
/// Volatile fallback for running without a cache service. The `ttl`
/// argument is ignored: idle keys are never actively evicted, so stale
/// turns for an inactive user sit in memory until the next save for that
/// user re-filters them. The cache-backed adapter is the one with real
/// expiry; this weaker guarantee is acceptable because every save applies
/// the recency filter before persisting.
#[derive(Debug, Default)]
pub struct InMemoryContextBackend {
    contexts: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl InMemoryContextBackend {
    /// Create a new empty InMemoryContextBackend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextBackend for InMemoryContextBackend {
    async fn fetch(
        &self,
        user_id: &str,
    ) -> Result<Option<Vec<ConversationTurn>>, ContextStoreError> {
        let contexts = self.contexts.read().map_err(|e| {
            ContextStoreError::StorageError(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(contexts.get(user_id).cloned())
    }

    async fn store(
        &self,
        user_id: &str,
        turns: &[ConversationTurn],
        _ttl: Duration,
    ) -> Result<(), ContextStoreError> {
        let mut contexts = self.contexts.write().map_err(|e| {
            ContextStoreError::StorageError(format!("Failed to acquire write lock: {}", e))
        })?;

        contexts.insert(user_id.to_string(), turns.to_vec());
        debug!(user_id = %user_id, count = turns.len(), "Stored conversation context in memory");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::store::Role;

    #[tokio::test]
    async fn fetch_of_absent_key_is_none() {
        let backend = InMemoryContextBackend::new();

        assert_eq!(backend.fetch("U1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn store_then_fetch_returns_the_turns() {
        let backend = InMemoryContextBackend::new();
        let turns = vec![ConversationTurn::text(Role::User, "hello", 1_700_000_000)];

        backend
            .store("U1", &turns, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(backend.fetch("U1").await.unwrap(), Some(turns));
    }

    #[tokio::test]
    async fn store_replaces_previous_turns() {
        let backend = InMemoryContextBackend::new();
        let first = vec![ConversationTurn::text(Role::User, "first", 1_700_000_000)];
        let second = vec![ConversationTurn::text(Role::User, "second", 1_700_000_100)];

        backend
            .store("U1", &first, Duration::from_secs(60))
            .await
            .unwrap();
        backend
            .store("U1", &second, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(backend.fetch("U1").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn keys_are_independent_per_user() {
        let backend = InMemoryContextBackend::new();
        let turns = vec![ConversationTurn::text(Role::User, "hello", 1_700_000_000)];

        backend
            .store("U1", &turns, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(backend.fetch("U2").await.unwrap(), None);
    }
}
