//! Turnlog Store - EventStore backends.
//!
//! Two implementations of the [`turnlog_traits::EventStore`] trait:
//! - [`InMemoryEventStore`]: process-local store for demos and tests
//! - [`AgentMemoryClient`]: HTTP client for a hosted conversational-memory
//!   service

pub mod http;
mod http_client;
pub mod memory;

pub use http::{AgentMemoryClient, AgentMemoryConfig};
pub use memory::InMemoryEventStore;
