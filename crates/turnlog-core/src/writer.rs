//! Background-queued conversational-memory writer.
//!
//! Buffers completed chat turns in memory and flushes them to the event
//! store on a fixed schedule, so store latency never blocks the turn that
//! produced the data and bursty traffic does not hit the store once per
//! turn. One failed write drops that turn only; it never blocks the rest
//! of the batch and is not retried.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use turnlog_traits::{ConversationTurn, EventStore, StoreError};

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// How long the worker waits between flush passes.
    pub flush_interval: Duration,
    /// Deadline for a single store append, independent of any stop timeout.
    pub store_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(3),
            store_timeout: Duration::from_secs(10),
        }
    }
}

/// Writer lifecycle state.
///
/// `Running` accepts enqueues with an active worker, `Stopping` still
/// accepts enqueues while the worker drains, `Stopped` is terminal: a
/// new writer instance is required to resume persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Running,
    Stopping,
    Stopped,
}

/// Sink for write failures, called once per dropped turn.
///
/// The writer performs no retries; whatever policy the embedding
/// application wants (requeue, dead-letter, alerting) starts here.
pub trait WriteFailureSink: Send + Sync {
    fn on_write_failure(&self, turn: &ConversationTurn, error: &StoreError);
}

/// Default failure sink: logs the dropped turn via tracing.
pub struct TracingFailureSink;

impl WriteFailureSink for TracingFailureSink {
    fn on_write_failure(&self, turn: &ConversationTurn, error: &StoreError) {
        warn!(
            session = %turn.session,
            transient = error.is_transient(),
            error = %error,
            "Dropped conversation turn after failed store write"
        );
    }
}

/// State shared between the writer handle and its background worker.
struct WriterShared {
    store: Arc<dyn EventStore>,
    config: WriterConfig,
    pending: Mutex<Vec<ConversationTurn>>,
    state: Mutex<WriterState>,
    cancel: CancellationToken,
    failure_sink: Arc<dyn WriteFailureSink>,
    flushed: AtomicU64,
    dropped: AtomicU64,
    worker_entries: AtomicU64,
}

impl WriterShared {
    /// Main worker loop: wait for the interval or the stop signal, then
    /// drain and flush. The worker suspends only at this wait point,
    /// never mid-batch.
    async fn run_loop(self: Arc<Self>) {
        self.worker_entries.fetch_add(1, Ordering::SeqCst);
        debug!(
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            "Memory writer worker started"
        );

        loop {
            let stopping = tokio::select! {
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(self.config.flush_interval) => false,
            };

            self.flush_pending().await;

            if stopping {
                // Covers turns enqueued while the batch above was flushing.
                self.flush_pending().await;
                break;
            }
        }

        debug!("Memory writer worker exited");
    }

    /// Snapshot-drain the queue and flush it item by item in enqueue
    /// order. Turns enqueued during the flush are left for the next pass.
    async fn flush_pending(&self) {
        let batch = {
            let mut pending = self.pending.lock();
            if pending.is_empty() {
                return;
            }
            std::mem::take(&mut *pending)
        };

        debug!(count = batch.len(), "Flushing conversation turns");

        for turn in batch {
            let messages = turn.to_messages();
            let append = self.store.create_event(&turn.session, &messages);
            match tokio::time::timeout(self.config.store_timeout, append).await {
                Ok(Ok(())) => {
                    self.flushed.fetch_add(1, Ordering::SeqCst);
                }
                Ok(Err(err)) => {
                    self.dropped.fetch_add(1, Ordering::SeqCst);
                    self.failure_sink.on_write_failure(&turn, &err);
                }
                Err(_) => {
                    let err = StoreError::Timeout {
                        elapsed_ms: self.config.store_timeout.as_millis() as u64,
                    };
                    self.dropped.fetch_add(1, Ordering::SeqCst);
                    self.failure_sink.on_write_failure(&turn, &err);
                }
            }
        }
    }
}

/// Asynchronous, batched persistence of chat turns to an external
/// append-only event store.
///
/// Producers call [`enqueue`](Self::enqueue) and never block on
/// persistence; a single background worker (launched by
/// [`start`](Self::start)) flushes the queue every
/// [`WriterConfig::flush_interval`]. Within one session, turns reach the
/// store in enqueue order; across sessions there is no ordering
/// guarantee.
pub struct ConversationMemoryWriter {
    shared: Arc<WriterShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationMemoryWriter {
    pub fn new(store: Arc<dyn EventStore>, config: WriterConfig) -> Self {
        Self {
            shared: Arc::new(WriterShared {
                store,
                config,
                pending: Mutex::new(Vec::new()),
                state: Mutex::new(WriterState::Running),
                cancel: CancellationToken::new(),
                failure_sink: Arc::new(TracingFailureSink),
                flushed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                worker_entries: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Replace the default tracing failure sink.
    pub fn with_failure_sink(mut self, sink: Arc<dyn WriteFailureSink>) -> Self {
        let shared = Arc::get_mut(&mut self.shared)
            .expect("with_failure_sink must be called before start()");
        shared.failure_sink = sink;
        self
    }

    /// Launch the background worker. Idempotent: a second call while the
    /// worker is alive is a no-op, and a stopped writer is never
    /// restarted (its queue state is stale by then).
    pub fn start(&self) {
        let mut worker = self.worker.lock();

        if *self.shared.state.lock() == WriterState::Stopped {
            warn!("Memory writer already stopped; not restarting");
            return;
        }
        if let Some(handle) = worker.as_ref() {
            if !handle.is_finished() {
                debug!("Memory writer worker already running");
                return;
            }
        }

        let shared = self.shared.clone();
        *worker = Some(tokio::spawn(shared.run_loop()));
        info!("Memory writer started");
    }

    /// Queue one completed turn for persistence. Fire-and-forget: never
    /// blocks, never errors. After [`stop`](Self::stop) the turn is
    /// dropped, since nothing remains to drain it.
    pub fn enqueue(&self, turn: ConversationTurn) {
        if *self.shared.state.lock() == WriterState::Stopped {
            self.shared.dropped.fetch_add(1, Ordering::SeqCst);
            warn!(session = %turn.session, "Writer stopped; dropping conversation turn");
            return;
        }
        self.shared.pending.lock().push(turn);
    }

    /// Signal the worker to stop and wait for it to drain and exit,
    /// bounded by `timeout`.
    ///
    /// The worker finishes its final drain before exiting; each store
    /// call inside the drain is still bounded by
    /// [`WriterConfig::store_timeout`], so a wedged store cannot hold up
    /// shutdown past `timeout`. If `timeout` expires first, undrained
    /// turns are abandoned and logged. The writer is `Stopped` afterwards
    /// either way.
    pub async fn stop(&self, timeout: Duration) {
        {
            let mut state = self.shared.state.lock();
            if *state == WriterState::Stopped {
                return;
            }
            *state = WriterState::Stopping;
        }

        info!("Memory writer stopping");
        self.shared.cancel.cancel();

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(timeout, handle).await.is_err() {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Stop timeout expired before the final drain completed"
                );
            }
        }

        *self.shared.state.lock() = WriterState::Stopped;

        let undrained = self.shared.pending.lock().len();
        if undrained > 0 {
            warn!(undrained, "Conversation turns left undrained at shutdown");
        }
        info!(
            flushed = self.flushed_count(),
            dropped = self.dropped_count(),
            "Memory writer stopped"
        );
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WriterState {
        *self.shared.state.lock()
    }

    /// Turns currently waiting in the queue.
    pub fn pending_len(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Turns successfully appended to the store.
    pub fn flushed_count(&self) -> u64 {
        self.shared.flushed.load(Ordering::SeqCst)
    }

    /// Turns dropped after a failed or timed-out store write (plus any
    /// enqueued after stop).
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::SeqCst)
    }

    /// Number of worker-loop launches. Stays at 1 for a well-behaved
    /// instance regardless of how many times `start` is called.
    pub fn worker_entry_count(&self) -> u64 {
        self.shared.worker_entries.load(Ordering::SeqCst)
    }
}
