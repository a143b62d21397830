//! CLI configuration file support
//!
//! Loads configuration from ~/.config/turnlog/config.toml, with
//! `TURNLOG_*` environment variables and CLI flags taking precedence.
//! The resolved config is built once in main() and passed down; no
//! component reads configuration lazily on its own.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use turnlog_core::WriterConfig;
use turnlog_store::{AgentMemoryClient, AgentMemoryConfig, InMemoryEventStore};
use turnlog_traits::{EventStore, SessionKey};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Hosted memory service settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Conversation identity defaults
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Writer tuning
    #[serde(default)]
    pub writer: WriterSettings,
}

/// Hosted memory service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service endpoint; when unset the CLI runs against an in-memory store
    pub base_url: Option<String>,
    /// Bearer token for the service
    pub api_key: Option<String>,
    /// Memory resource id
    pub memory_id: Option<String>,
}

/// Conversation identity defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub actor_id: Option<String>,
    pub session_id: Option<String>,
}

/// Writer tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriterSettings {
    /// Seconds between background flush passes
    pub flush_interval_secs: Option<u64>,
    /// Per-call deadline for store appends, in seconds
    pub store_timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Ignoring unreadable config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("turnlog").join("config.toml"))
    }

    /// Apply `TURNLOG_*` environment overrides for service settings.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TURNLOG_BASE_URL") {
            self.service.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("TURNLOG_API_KEY") {
            self.service.api_key = Some(key);
        }
        if let Ok(id) = std::env::var("TURNLOG_MEMORY_ID") {
            self.service.memory_id = Some(id);
        }
    }

    /// Resolve the session key: CLI flags win, then config file, then
    /// defaults (a fresh uuid session under the default actor).
    pub fn session_key(&self, actor: Option<String>, session: Option<String>) -> SessionKey {
        let actor_id = actor
            .or_else(|| self.conversation.actor_id.clone())
            .unwrap_or_else(|| "user123".to_string());
        let session_id = session
            .or_else(|| self.conversation.session_id.clone())
            .unwrap_or_else(|| {
                let generated = uuid::Uuid::new_v4().to_string();
                info!(session_id = %generated, "No session configured; starting a new one");
                generated
            });
        SessionKey::new(actor_id, session_id)
    }

    /// Writer configuration from the `[writer]` section.
    pub fn writer_config(&self) -> WriterConfig {
        let defaults = WriterConfig::default();
        WriterConfig {
            flush_interval: self
                .writer
                .flush_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.flush_interval),
            store_timeout: self
                .writer
                .store_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.store_timeout),
        }
    }

    /// Build the event store: the hosted service when an endpoint is
    /// configured, otherwise an in-memory store (demo mode).
    pub fn build_store(&self) -> Arc<dyn EventStore> {
        match &self.service.base_url {
            Some(base_url) => {
                let memory_id = self
                    .service
                    .memory_id
                    .clone()
                    .unwrap_or_else(|| "agentic-memory".to_string());
                let mut config = AgentMemoryConfig::new(base_url.clone(), memory_id);
                if let Some(key) = &self.service.api_key {
                    config = config.with_api_key(key.clone());
                }
                info!(endpoint = %base_url, "Using hosted memory service");
                Arc::new(AgentMemoryClient::new(config))
            }
            None => {
                warn!("No service endpoint configured; using in-memory store (demo mode)");
                Arc::new(InMemoryEventStore::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: CliConfig = toml::from_str(
            r#"
            [service]
            base_url = "https://memory.example.com/v1"
            api_key = "secret"
            memory_id = "mem-1"

            [conversation]
            actor_id = "user123"
            session_id = "session126"

            [writer]
            flush_interval_secs = 5
            store_timeout_secs = 20
            "#,
        )
        .unwrap();

        assert_eq!(
            config.service.base_url.as_deref(),
            Some("https://memory.example.com/v1")
        );
        let key = config.session_key(None, None);
        assert_eq!(key.to_string(), "user123/session126");

        let writer = config.writer_config();
        assert_eq!(writer.flush_interval, Duration::from_secs(5));
        assert_eq!(writer.store_timeout, Duration::from_secs(20));
    }

    #[test]
    fn flags_override_config_file() {
        let config: CliConfig = toml::from_str(
            r#"
            [conversation]
            actor_id = "config-actor"
            session_id = "config-session"
            "#,
        )
        .unwrap();

        let key = config.session_key(Some("flag-actor".into()), None);
        assert_eq!(key.actor_id, "flag-actor");
        assert_eq!(key.session_id, "config-session");
    }

    #[test]
    fn empty_config_gets_defaults() {
        let config = CliConfig::default();
        let key = config.session_key(None, None);
        assert_eq!(key.actor_id, "user123");
        assert!(!key.session_id.is_empty());

        let writer = config.writer_config();
        assert_eq!(writer.flush_interval, Duration::from_secs(3));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = CliConfig::load_from_path(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(config.service.base_url.is_none());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [service]
            base_url = "https://memory.example.com/v1"
            "#,
        )
        .unwrap();

        let config = CliConfig::load_from_path(Some(path));
        assert_eq!(
            config.service.base_url.as_deref(),
            Some("https://memory.example.com/v1")
        );
    }
}
