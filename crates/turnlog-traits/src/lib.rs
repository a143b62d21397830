//! Turnlog Traits - Shared trait definitions and data types.
//!
//! This crate provides the shared interfaces used across the Turnlog workspace:
//! - EventStore trait for append-only conversational event services
//! - SessionKey, ConversationTurn, EventMessage, StoredEvent data types
//! - StoreError taxonomy distinguishing transient from non-retryable failures

pub mod error;
pub mod store;
pub mod types;

// ── Top-level re-exports ─────────────────────────────────────────────

pub use error::{Result, StoreError};
pub use store::EventStore;
pub use types::{ConversationTurn, EventMessage, MessageRole, SessionKey, StoredEvent};
