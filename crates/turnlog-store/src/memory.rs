//! Process-local event store for demos and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use turnlog_traits::{EventMessage, EventStore, Result, SessionKey, StoredEvent};

/// In-memory append-only event store keyed by session.
///
/// Used by the demo CLI when no service endpoint is configured, and by
/// tests that need a real store without network access. Like the hosted
/// service, it makes no idempotency guarantee: every `create_event` call
/// appends a new event.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<String, Vec<StoredEvent>>>,
    append_count: AtomicU64,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `create_event` calls accepted so far.
    pub fn append_count(&self) -> u64 {
        self.append_count.load(Ordering::SeqCst)
    }

    /// Number of events stored for one session.
    pub fn event_count(&self, session: &SessionKey) -> usize {
        self.events
            .read()
            .get(&session.to_string())
            .map(|events| events.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn create_event(&self, session: &SessionKey, messages: &[EventMessage]) -> Result<()> {
        let event = StoredEvent {
            messages: messages.to_vec(),
            created_at: Utc::now(),
        };
        self.events
            .write()
            .entry(session.to_string())
            .or_default()
            .push(event);
        self.append_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_events(
        &self,
        session: &SessionKey,
        max_results: usize,
    ) -> Result<Vec<StoredEvent>> {
        let events = self.events.read();
        let Some(session_events) = events.get(&session.to_string()) else {
            return Ok(Vec::new());
        };

        // Oldest-to-newest, keeping the most recent `max_results` events.
        let skip = session_events.len().saturating_sub(max_results);
        Ok(session_events.iter().skip(skip).cloned().collect())
    }
}
