use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::context::store::{ContextBackend, ContextStoreError, ConversationTurn};

/// Cache-backed implementation of `ContextBackend`.
///
/// Contexts are stored as JSON under a per-user key with a native TTL, so
/// expiry is enforced by the cache service itself and contexts survive
/// process restarts.
#[derive(Clone)]
pub struct RedisContextBackend {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisContextBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisContextBackend").finish_non_exhaustive()
    }
}

impl RedisContextBackend {
    /// Connect to the cache service at `url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self, ContextStoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| ContextStoreError::StorageError(format!("Invalid cache URL: {}", e)))?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            ContextStoreError::StorageError(format!("Failed to connect to cache: {}", e))
        })?;

        info!("Connected to context cache");
        Ok(Self { connection })
    }

    fn key(user_id: &str) -> String {
        format!("context:{}", user_id)
    }
}

#[async_trait]
impl ContextBackend for RedisContextBackend {
    async fn fetch(
        &self,
        user_id: &str,
    ) -> Result<Option<Vec<ConversationTurn>>, ContextStoreError> {
        let mut connection = self.connection.clone();

        let raw: Option<String> = connection
            .get(Self::key(user_id))
            .await
            .map_err(|e| ContextStoreError::StorageError(format!("GET failed: {}", e)))?;

        match raw {
            Some(json) => {
                let turns = serde_json::from_str(&json).map_err(|e| {
                    ContextStoreError::SerializationError(format!(
                        "Stored context is not valid JSON: {}",
                        e
                    ))
                })?;
                Ok(Some(turns))
            }
            None => Ok(None),
        }
    }

    async fn store(
        &self,
        user_id: &str,
        turns: &[ConversationTurn],
        ttl: Duration,
    ) -> Result<(), ContextStoreError> {
        let json = serde_json::to_string(turns).map_err(|e| {
            ContextStoreError::SerializationError(format!("Failed to encode context: {}", e))
        })?;

        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(Self::key(user_id), json, ttl.as_secs())
            .await
            .map_err(|e| ContextStoreError::StorageError(format!("SETEX failed: {}", e)))?;

        debug!(user_id = %user_id, count = turns.len(), "Stored conversation context in cache");
        Ok(())
    }
}
