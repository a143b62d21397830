//! Core data types shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── SessionKey ───────────────────────────────────────────────────────

/// Identifies one conversation thread: an actor plus a session.
///
/// History reads and writes are scoped by this pair. The store assumes
/// monotonically increasing arrival order per session when reconstructing
/// history, which is why the writer preserves enqueue order per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub actor_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(actor_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.actor_id, self.session_id)
    }
}

// ── Messages and events ──────────────────────────────────────────────

/// Role of a message within a conversational event.
///
/// Serialized as `USER` / `ASSISTANT` to match the wire format of the
/// hosted memory service. Payload items with unrecognized roles are
/// skipped on read rather than treated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One role/text item of an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub role: MessageRole,
    pub text: String,
}

impl EventMessage {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// One event as returned by the store's list operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub messages: Vec<EventMessage>,
    pub created_at: DateTime<Utc>,
}

// ── ConversationTurn ─────────────────────────────────────────────────

/// One completed user-input/assistant-response exchange.
///
/// Constructed only after the full assistant response is assembled (the
/// writer never sees partial or streaming text) and immutable afterwards.
/// Owned exclusively by the pending queue until handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub session: SessionKey,
    pub user_input: String,
    pub agent_response: String,
}

impl ConversationTurn {
    pub fn new(
        session: SessionKey,
        user_input: impl Into<String>,
        agent_response: impl Into<String>,
    ) -> Self {
        Self {
            session,
            user_input: user_input.into(),
            agent_response: agent_response.into(),
        }
    }

    /// Event payload for this turn: user message first, then assistant.
    pub fn to_messages(&self) -> [EventMessage; 2] {
        [
            EventMessage::new(MessageRole::User, self.user_input.clone()),
            EventMessage::new(MessageRole::Assistant, self.agent_response.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_format() {
        assert_eq!(
            serde_json::to_string(&MessageRole::User).unwrap(),
            "\"USER\""
        );
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"ASSISTANT\""
        );

        let role: MessageRole = serde_json::from_str("\"ASSISTANT\"").unwrap();
        assert_eq!(role, MessageRole::Assistant);
    }

    #[test]
    fn turn_message_order() {
        let turn = ConversationTurn::new(SessionKey::new("user123", "session126"), "hi", "hello");
        let [first, second] = turn.to_messages();
        assert_eq!(first.role, MessageRole::User);
        assert_eq!(first.text, "hi");
        assert_eq!(second.role, MessageRole::Assistant);
        assert_eq!(second.text, "hello");
    }

    #[test]
    fn session_key_display() {
        let key = SessionKey::new("user123", "session126");
        assert_eq!(key.to_string(), "user123/session126");
    }
}
