//! # Engine events emitted by pollers, caches and broadcasters.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Poll events**: producer invocation flow (started, completed, failed, timeout, dropped)
//! - **Cache events**: how a delivery changed a precached entry
//! - **Broadcast events**: subscriber lifecycle and fan-out
//! - **Observer events**: problems in the observer fan-out itself
//!
//! The [`Event`] struct carries additional metadata such as timestamps, source name,
//! reasons, cycle numbers and subscriber ids.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore publication order; `cycle` identifies the producer invocation,
//! which may complete out of order.
//!
//! ## Example
//! ```rust
//! use pollcast::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ProduceFailed)
//!     .with_source("commits")
//!     .with_reason("503")
//!     .with_cycle(3);
//!
//! assert_eq!(ev.kind, EventKind::ProduceFailed);
//! assert_eq!(ev.source.as_deref(), Some("commits"));
//! assert_eq!(ev.cycle, Some(3));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer events ===
    /// Observer panicked during event processing.
    ///
    /// Sets:
    /// - `source`: observer name
    /// - `reason`: panic info/message
    ObserverPanicked,

    /// Observer dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: observer name
    /// - `reason`: reason string (e.g., "full", "closed")
    ObserverOverflow,

    // === Poll events ===
    /// A producer invocation is starting.
    ///
    /// Sets:
    /// - `source`: poller name
    /// - `cycle`: invocation number (1-based)
    ProduceStarted,

    /// A producer invocation returned a value (or an absent value).
    ///
    /// Sets:
    /// - `source`: poller name
    /// - `cycle`: invocation number
    /// - `elapsed_ms`: invocation latency
    ProduceCompleted,

    /// A producer invocation returned an error or panicked.
    ///
    /// Sets:
    /// - `source`: poller name
    /// - `cycle`: invocation number
    /// - `elapsed_ms`: invocation latency
    /// - `reason`: error message
    ProduceFailed,

    /// A producer invocation exceeded the configured timeout.
    ///
    /// Always followed by [`EventKind::ProduceFailed`] for the same cycle.
    ///
    /// Sets:
    /// - `source`: poller name
    /// - `cycle`: invocation number
    /// - `timeout_ms`: configured timeout
    TimeoutHit,

    /// A result finished after the poller stopped and was discarded.
    ///
    /// Sets:
    /// - `source`: poller name
    /// - `cycle`: invocation number
    ResultDropped,

    /// The poller stopped ticking (published once).
    ///
    /// Sets:
    /// - `source`: poller name
    PollerStopped,

    // === Cache events ===
    /// A delivery replaced the cached value.
    ///
    /// Sets:
    /// - `source`: cache name
    /// - `cycle`: invocation number
    /// - `reason`: producer error (if the delivery carried one alongside a value)
    CacheStored,

    /// A delivery carried no value; the previous value was kept.
    ///
    /// Sets:
    /// - `source`: cache name
    /// - `cycle`: invocation number
    /// - `reason`: producer error, if any
    CacheRetained,

    // === Broadcast events ===
    /// A subscriber was registered.
    ///
    /// Sets:
    /// - `source`: broadcaster name
    /// - `subscriber`: subscriber id
    SubscriberAdded,

    /// A subscriber was deregistered.
    ///
    /// Sets:
    /// - `source`: broadcaster name
    /// - `subscriber`: subscriber id
    /// - `reason`: one of
    ///   - "removed": `del_sub` was called
    ///   - "cancelled": the subscriber's token fired
    ///   - "disconnected": the receiver was dropped
    SubscriberRemoved,

    /// A result was delivered to every registered subscriber.
    ///
    /// Sets:
    /// - `source`: broadcaster name
    /// - `cycle`: invocation number
    /// - `fanout`: number of subscribers that received it
    ResultBroadcast,

    /// The broadcaster closed; every sink was released.
    ///
    /// Sets:
    /// - `source`: broadcaster name
    /// - `fanout`: number of sinks closed
    BroadcasterClosed,
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the emitting component (poller, cache, broadcaster, observer).
    pub source: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Producer invocation number (starting from 1).
    pub cycle: Option<u64>,
    /// Subscriber id, for broadcast lifecycle events.
    pub subscriber: Option<u64>,
    /// Number of subscribers reached.
    pub fanout: Option<u32>,
    /// Producer latency in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Configured timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            reason: None,
            cycle: None,
            subscriber: None,
            fanout: None,
            elapsed_ms: None,
            timeout_ms: None,
        }
    }

    /// Attaches the emitting component name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a producer invocation number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a subscriber id.
    #[inline]
    pub fn with_subscriber(mut self, id: u64) -> Self {
        self.subscriber = Some(id);
        self
    }

    /// Attaches a fan-out count.
    #[inline]
    pub fn with_fanout(mut self, n: usize) -> Self {
        self.fanout = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches a producer latency (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_source(observer)
            .with_reason(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_source(observer)
            .with_reason(info)
    }

    #[inline]
    pub fn is_observer_overflow(&self) -> bool {
        matches!(self.kind, EventKind::ObserverOverflow)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
