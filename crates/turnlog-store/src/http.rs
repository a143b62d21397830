//! HTTP client for a hosted conversational-memory service.
//!
//! The service exposes an append-only event log per actor/session pair,
//! addressed under a memory resource:
//!
//! - `POST /memories/{memory_id}/actors/{actor}/sessions/{session}/events`
//! - `GET  /memories/{memory_id}/actors/{actor}/sessions/{session}/events?maxResults=N`
//!
//! Payload items carry their role as a string; items with roles this
//! client does not recognize are skipped on read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use turnlog_traits::{
    EventMessage, EventStore, MessageRole, Result, SessionKey, StoreError, StoredEvent,
};

use crate::http_client::build_http_client;

/// Connection settings for the hosted memory service.
#[derive(Debug, Clone)]
pub struct AgentMemoryConfig {
    /// Service endpoint, e.g. `https://memory.example.com/v1`.
    pub base_url: String,
    /// Bearer token, if the service requires one.
    pub api_key: Option<String>,
    /// Memory resource all sessions of this client live under.
    pub memory_id: String,
    /// Request timeout applied to every call.
    pub timeout: Duration,
}

impl AgentMemoryConfig {
    pub fn new(base_url: impl Into<String>, memory_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            memory_id: memory_id.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP-backed [`EventStore`] implementation.
pub struct AgentMemoryClient {
    client: Client,
    config: AgentMemoryConfig,
}

impl AgentMemoryClient {
    pub fn new(config: AgentMemoryConfig) -> Self {
        Self {
            client: build_http_client(config.timeout),
            config,
        }
    }

    fn events_url(&self, session: &SessionKey) -> String {
        format!(
            "{}/memories/{}/actors/{}/sessions/{}/events",
            self.config.base_url.trim_end_matches('/'),
            self.config.memory_id,
            session.actor_id,
            session.session_id
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct CreateEventRequest<'a> {
    messages: &'a [WireMessage],
}

#[derive(Serialize)]
struct WireMessage {
    role: MessageRole,
    text: String,
}

#[derive(Deserialize)]
struct ListEventsResponse {
    #[serde(default)]
    events: Vec<EventEnvelope>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventEnvelope {
    created_at: DateTime<Utc>,
    #[serde(default)]
    payload: Vec<PayloadItem>,
}

/// Role arrives as a plain string so that payload items written by other
/// producers (tool results, system notes) do not fail the whole read.
#[derive(Deserialize)]
struct PayloadItem {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl PayloadItem {
    fn into_message(self) -> Option<EventMessage> {
        let role = match self.role.as_deref() {
            Some("USER") => MessageRole::User,
            Some("ASSISTANT") => MessageRole::Assistant,
            _ => return None,
        };
        let text = self.text?;
        if text.is_empty() {
            return None;
        }
        Some(EventMessage { role, text })
    }
}

// ── Error mapping ────────────────────────────────────────────────────

fn map_request_error(err: reqwest::Error, timeout: Duration) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout {
            elapsed_ms: timeout.as_millis() as u64,
        }
    } else {
        StoreError::Transient(err.to_string())
    }
}

fn map_status_error(status: StatusCode, body: String) -> StoreError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StoreError::Transient(format!("{status}: {body}"))
    } else {
        StoreError::Rejected(format!("{status}: {body}"))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_status_error(status, body))
}

#[async_trait]
impl EventStore for AgentMemoryClient {
    async fn create_event(&self, session: &SessionKey, messages: &[EventMessage]) -> Result<()> {
        let wire_messages: Vec<WireMessage> = messages
            .iter()
            .map(|m| WireMessage {
                role: m.role,
                text: m.text.clone(),
            })
            .collect();
        let body = CreateEventRequest {
            messages: &wire_messages,
        };

        let response = self
            .authorize(self.client.post(self.events_url(session)).json(&body))
            .send()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout))?;

        check_status(response).await?;
        debug!(session = %session, count = messages.len(), "Event appended");
        Ok(())
    }

    async fn list_events(
        &self,
        session: &SessionKey,
        max_results: usize,
    ) -> Result<Vec<StoredEvent>> {
        let response = self
            .authorize(self.client.get(self.events_url(session)))
            .query(&[("maxResults", max_results)])
            .send()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout))?;

        let response = check_status(response).await?;
        let parsed: ListEventsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .events
            .into_iter()
            .map(|envelope| StoredEvent {
                messages: envelope
                    .payload
                    .into_iter()
                    .filter_map(PayloadItem::into_message)
                    .collect(),
                created_at: envelope.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AgentMemoryClient {
        AgentMemoryClient::new(
            AgentMemoryConfig::new(server.uri(), "mem-1")
                .with_api_key("test-key")
                .with_timeout(Duration::from_secs(2)),
        )
    }

    fn session() -> SessionKey {
        SessionKey::new("user123", "session126")
    }

    #[tokio::test]
    async fn create_event_encodes_roles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/memories/mem-1/actors/user123/sessions/session126/events",
            ))
            .and(body_json(json!({
                "messages": [
                    { "role": "USER", "text": "hi" },
                    { "role": "ASSISTANT", "text": "hello" },
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let messages = [
            EventMessage::new(MessageRole::User, "hi"),
            EventMessage::new(MessageRole::Assistant, "hello"),
        ];
        client.create_event(&session(), &messages).await.unwrap();
    }

    #[tokio::test]
    async fn list_events_parses_and_filters_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/memories/mem-1/actors/user123/sessions/session126/events",
            ))
            .and(query_param("maxResults", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [
                    {
                        "createdAt": "2026-08-30T12:00:00Z",
                        "payload": [
                            { "role": "USER", "text": "hi" },
                            { "role": "ASSISTANT", "text": "hello" },
                            { "role": "TOOL", "text": "ignored" },
                            { "text": "no role" },
                        ]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let events = client.list_events(&session(), 5).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].messages.len(), 2);
        assert_eq!(events[0].messages[0].role, MessageRole::User);
        assert_eq!(events[0].messages[1].text, "hello");
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .create_event(&session(), &[EventMessage::new(MessageRole::User, "hi")])
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn throttling_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .create_event(&session(), &[EventMessage::new(MessageRole::User, "hi")])
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn client_errors_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.list_events(&session(), 5).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.list_events(&session(), 5).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidResponse(_)));
    }
}
