use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Turns older than this are pruned on every save, and the persisted entry
/// expires after the same window where the backend supports it.
pub const RETENTION_SECS: i64 = 24 * 60 * 60;

/// At most this many turns survive a save.
pub const MAX_TURNS: usize = 20;

/// Error type for context store operations
#[derive(Error, Debug)]
pub enum ContextStoreError {
    /// Error occurred during a backend operation
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One content fragment of a turn: plain text or an inline binary
/// attachment, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

/// One message exchanged in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<TurnPart>,
    /// Epoch seconds at the time the turn was recorded.
    pub timestamp: i64,
}

impl ConversationTurn {
    /// A single-text-part turn.
    pub fn text(role: Role, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            parts: vec![TurnPart::Text(text.into())],
            timestamp,
        }
    }
}

/// Raw key-value access beneath the retention policy.
///
/// Implementations store the turn list verbatim; filtering and truncation
/// are the `ContextStore`'s job. `ttl` is the requested expiry; backends
/// without native expiry may ignore it (see `InMemoryContextBackend`).
#[async_trait]
pub trait ContextBackend: Send + Sync + Debug {
    /// Fetch the stored turns for a user, `None` when absent or expired.
    async fn fetch(
        &self,
        user_id: &str,
    ) -> Result<Option<Vec<ConversationTurn>>, ContextStoreError>;

    /// Store the turns for a user, replacing anything already there.
    async fn store(
        &self,
        user_id: &str,
        turns: &[ConversationTurn],
        ttl: Duration,
    ) -> Result<(), ContextStoreError>;
}

/// Type alias for Arc-wrapped ContextBackend trait objects
pub type ContextBackendRef = Arc<dyn ContextBackend>;

/// Conversation store with bounded retention.
///
/// Load and save never fail the caller: backend errors are logged with the
/// user id and degrade to an empty history (load) or a dropped write (save).
#[derive(Debug, Clone)]
pub struct ContextStore {
    backend: ContextBackendRef,
}

impl ContextStore {
    pub fn new(backend: ContextBackendRef) -> Self {
        Self { backend }
    }

    /// Load a user's history. Empty when absent, expired, or the backend
    /// fails.
    pub async fn load(&self, user_id: &str) -> Vec<ConversationTurn> {
        match self.backend.fetch(user_id).await {
            Ok(Some(turns)) => turns,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load conversation context, starting fresh");
                Vec::new()
            }
        }
    }

    /// Persist a user's history after applying the retention policy: drop
    /// turns older than the retention window, then keep the most recent
    /// `MAX_TURNS`.
    pub async fn save(&self, user_id: &str, turns: Vec<ConversationTurn>) {
        let now = Utc::now().timestamp();
        let kept = prune(turns, now);

        if let Err(e) = self
            .backend
            .store(user_id, &kept, Duration::from_secs(RETENTION_SECS as u64))
            .await
        {
            warn!(user_id = %user_id, error = %e, "Failed to save conversation context");
        }
    }
}

/// Recency filter first, hard cap second: the turns kept are the most
/// recent `MAX_TURNS` of those still within the retention window.
fn prune(turns: Vec<ConversationTurn>, now: i64) -> Vec<ConversationTurn> {
    let cutoff = now - RETENTION_SECS;
    let mut recent: Vec<ConversationTurn> =
        turns.into_iter().filter(|t| t.timestamp > cutoff).collect();

    if recent.len() > MAX_TURNS {
        recent.drain(..recent.len() - MAX_TURNS);
    }
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::adapters::InMemoryContextBackend;

    fn turn(n: i64, timestamp: i64) -> ConversationTurn {
        let role = if n % 2 == 0 { Role::User } else { Role::Model };
        ConversationTurn::text(role, format!("turn {}", n), timestamp)
    }

    #[test]
    fn prune_drops_turns_outside_the_retention_window() {
        let now = 1_700_000_000;
        let turns = vec![
            turn(0, now - RETENTION_SECS - 10),
            turn(1, now - RETENTION_SECS), // boundary: exactly at the cutoff is dropped
            turn(2, now - 100),
            turn(3, now),
        ];

        let kept = prune(turns, now);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].timestamp, now - 100);
        assert_eq!(kept[1].timestamp, now);
    }

    #[test]
    fn prune_keeps_the_most_recent_twenty() {
        let now = 1_700_000_000;
        let turns: Vec<_> = (0..25).map(|n| turn(n, now - 25 + n)).collect();

        let kept = prune(turns, now);
        assert_eq!(kept.len(), MAX_TURNS);
        // The five oldest were dropped; order is preserved.
        assert_eq!(kept[0].parts, vec![TurnPart::Text("turn 5".to_string())]);
        assert_eq!(
            kept.last().unwrap().parts,
            vec![TurnPart::Text("turn 24".to_string())]
        );
    }

    #[test]
    fn prune_filters_before_capping() {
        let now = 1_700_000_000;
        // 30 stale turns followed by 5 fresh ones. Capping before filtering
        // would keep stale turns and then drop them all; filtering first
        // keeps the 5 fresh ones.
        let mut turns: Vec<_> = (0..30)
            .map(|n| turn(n, now - RETENTION_SECS - 100 + n))
            .collect();
        turns.extend((30..35).map(|n| turn(n, now - 35 + n)));

        let kept = prune(turns, now);
        assert_eq!(kept.len(), 5);
        assert!(kept.iter().all(|t| t.timestamp > now - RETENTION_SECS));
    }

    #[test]
    fn saved_contexts_satisfy_the_retention_invariant() {
        let now = 1_700_000_000;
        let turns: Vec<_> = (0..40).map(|n| turn(n, now - 40 + n)).collect();

        let kept = prune(turns, now);
        assert!(kept.len() <= MAX_TURNS);
        assert!(kept.iter().all(|t| t.timestamp > now - RETENTION_SECS));
    }

    #[tokio::test]
    async fn save_then_load_round_trips_through_the_backend() {
        let store = ContextStore::new(Arc::new(InMemoryContextBackend::new()));
        let now = Utc::now().timestamp();
        let turns = vec![
            ConversationTurn::text(Role::User, "hello", now - 10),
            ConversationTurn::text(Role::Model, "hi!", now - 9),
        ];

        store.save("U1", turns.clone()).await;
        assert_eq!(store.load("U1").await, turns);
    }

    #[tokio::test]
    async fn load_of_unknown_user_is_empty() {
        let store = ContextStore::new(Arc::new(InMemoryContextBackend::new()));

        assert!(store.load("U-missing").await.is_empty());
    }

    #[tokio::test]
    async fn stale_turns_are_dropped_on_save_not_load() {
        let store = ContextStore::new(Arc::new(InMemoryContextBackend::new()));
        let now = Utc::now().timestamp();
        let turns = vec![
            ConversationTurn::text(Role::User, "old", now - RETENTION_SECS - 60),
            ConversationTurn::text(Role::User, "new", now - 5),
        ];

        store.save("U2", turns).await;
        let loaded = store.load("U2").await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].parts, vec![TurnPart::Text("new".to_string())]);
    }
}
