//! LINE Messaging API access.
//!
//! A narrow client surface over the endpoints the relay needs: webhook
//! event parsing and signature verification, the reply API, profile lookup,
//! and message-content download.

// Export client module - REST client for the Messaging API
pub mod client;
pub use client::*;

// Export webhook module - inbound event data structures
pub mod webhook;
pub use webhook::*;

// Export signature module - webhook signature verification
pub mod signature;
pub use signature::*;

// Export types module - outgoing messages and profile structures
pub mod types;
pub use types::*;

// Export errors module - shared error types
pub mod errors;
pub use errors::*;
