//! Storage trait abstraction for conversational event stores.
//!
//! The trait defines the two operations the rest of the workspace needs
//! from an append-only event service. Implementations are provided by
//! downstream crates (e.g., turnlog-store).

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EventMessage, SessionKey, StoredEvent};

/// An external append-only conversational event service, queryable by
/// session.
///
/// The store does not guarantee idempotency: duplicate `create_event`
/// calls with the same content create duplicate events. Within a session
/// the store assumes events arrive in conversation order.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event carrying the given messages to the session's log.
    async fn create_event(&self, session: &SessionKey, messages: &[EventMessage]) -> Result<()>;

    /// List events for a session, oldest to newest, bounded by `max_results`.
    async fn list_events(
        &self,
        session: &SessionKey,
        max_results: usize,
    ) -> Result<Vec<StoredEvent>>;
}
