//! Turnlog Core - asynchronous, batched persistence of chat turns.
//!
//! The chat pipeline calls [`ConversationMemoryWriter::enqueue`] once per
//! completed turn and never waits on the store; a single background worker
//! drains the queue on a fixed schedule and appends each turn to the
//! external event store. The read path ([`recent_history`]) rebuilds
//! prompt context from the store and degrades to an empty history when
//! the store is unreachable.

pub mod context;
pub mod writer;

pub use context::recent_history;
pub use writer::{
    ConversationMemoryWriter, TracingFailureSink, WriteFailureSink, WriterConfig, WriterState,
};
