//! # LogWriter: structured event logger
//!
//! An observer that renders incoming [`Event`]s through `tracing`.
//! Install any `tracing` subscriber in the host binary to collect the output.
//!
//! ## Levels
//! ```text
//! trace  produce-started, produce-completed, result-broadcast, cache-stored
//! debug  cache-retained, subscriber-added, subscriber-removed, result-dropped
//! info   poller-stopped, broadcaster-closed
//! warn   produce-failed, timeout-hit, observer-overflow
//! error  observer-panicked
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ProduceStarted => {
                tracing::trace!(source, cycle = e.cycle, "produce started");
            }
            EventKind::ProduceCompleted => {
                tracing::trace!(
                    source,
                    cycle = e.cycle,
                    elapsed_ms = e.elapsed_ms,
                    "produce completed"
                );
            }
            EventKind::ProduceFailed => {
                tracing::warn!(
                    source,
                    cycle = e.cycle,
                    elapsed_ms = e.elapsed_ms,
                    error = reason,
                    "produce failed"
                );
            }
            EventKind::TimeoutHit => {
                tracing::warn!(
                    source,
                    cycle = e.cycle,
                    timeout_ms = e.timeout_ms,
                    "produce timed out"
                );
            }
            EventKind::ResultDropped => {
                tracing::debug!(source, cycle = e.cycle, "late result dropped after stop");
            }
            EventKind::PollerStopped => {
                tracing::info!(source, "poller stopped");
            }
            EventKind::CacheStored => {
                tracing::trace!(source, cycle = e.cycle, error = reason, "cache stored value");
            }
            EventKind::CacheRetained => {
                tracing::debug!(
                    source,
                    cycle = e.cycle,
                    error = reason,
                    "cache retained previous value"
                );
            }
            EventKind::SubscriberAdded => {
                tracing::debug!(source, subscriber = e.subscriber, "subscriber added");
            }
            EventKind::SubscriberRemoved => {
                tracing::debug!(source, subscriber = e.subscriber, reason, "subscriber removed");
            }
            EventKind::ResultBroadcast => {
                tracing::trace!(source, cycle = e.cycle, fanout = e.fanout, "result broadcast");
            }
            EventKind::BroadcasterClosed => {
                tracing::info!(source, fanout = e.fanout, "broadcaster closed");
            }
            EventKind::ObserverOverflow => {
                tracing::warn!(observer = source, reason, "observer overflow");
            }
            EventKind::ObserverPanicked => {
                tracing::error!(observer = source, info = reason, "observer panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
