//! Bounded conversation-context storage.
//!
//! Maps a user id to an ordered list of timestamped conversation turns. A
//! `ContextBackend` trait abstracts the raw storage; the `ContextStore`
//! wrapper applies the retention policy (24-hour recency filter, then a
//! 20-turn cap) on every save, so adapters stay dumb key-value stores.

pub mod adapters;
pub mod store;

pub use adapters::{InMemoryContextBackend, RedisContextBackend};
pub use store::{
    ContextBackend, ContextBackendRef, ContextStore, ContextStoreError, ConversationTurn, Role,
    TurnPart, MAX_TURNS, RETENTION_SECS,
};
