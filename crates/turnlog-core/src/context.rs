//! Read path: rebuild prompt context from the event store.

use tracing::warn;
use turnlog_traits::{EventStore, MessageRole, SessionKey};

/// Fetch the most recent conversation turns for a session, oldest to
/// newest, flattened to `(role, text)` pairs.
///
/// Conversational continuity is best-effort: any store failure degrades
/// to an empty history so the caller's chat turn proceeds without
/// context instead of failing.
pub async fn recent_history(
    store: &dyn EventStore,
    session: &SessionKey,
    max_results: usize,
) -> Vec<(MessageRole, String)> {
    match store.list_events(session, max_results).await {
        Ok(events) => events
            .into_iter()
            .flat_map(|event| event.messages)
            .map(|message| (message.role, message.text))
            .collect(),
        Err(err) => {
            warn!(
                session = %session,
                error = %err,
                "Failed to load conversation history; continuing without context"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use turnlog_store::InMemoryEventStore;
    use turnlog_traits::{EventMessage, Result, StoreError, StoredEvent};

    struct UnreachableStore;

    #[async_trait]
    impl EventStore for UnreachableStore {
        async fn create_event(
            &self,
            _session: &SessionKey,
            _messages: &[EventMessage],
        ) -> Result<()> {
            Err(StoreError::Transient("connection refused".into()))
        }

        async fn list_events(
            &self,
            _session: &SessionKey,
            _max_results: usize,
        ) -> Result<Vec<StoredEvent>> {
            Err(StoreError::Transient("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn returns_flattened_history_in_order() {
        let store = Arc::new(InMemoryEventStore::new());
        let session = SessionKey::new("user123", "s1");

        store
            .create_event(
                &session,
                &[
                    EventMessage::new(MessageRole::User, "hi"),
                    EventMessage::new(MessageRole::Assistant, "hello"),
                ],
            )
            .await
            .unwrap();
        store
            .create_event(
                &session,
                &[
                    EventMessage::new(MessageRole::User, "bye"),
                    EventMessage::new(MessageRole::Assistant, "goodbye"),
                ],
            )
            .await
            .unwrap();

        let history = recent_history(store.as_ref(), &session, 10).await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], (MessageRole::User, "hi".to_string()));
        assert_eq!(history[3], (MessageRole::Assistant, "goodbye".to_string()));
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty_history() {
        let session = SessionKey::new("user123", "s1");
        let history = recent_history(&UnreachableStore, &session, 10).await;
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_yields_empty_history() {
        let store = InMemoryEventStore::new();
        let session = SessionKey::new("user123", "never-seen");
        let history = recent_history(&store, &session, 10).await;
        assert!(history.is_empty());
    }
}
