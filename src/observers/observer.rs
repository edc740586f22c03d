//! # Observer trait.
//!
//! [`Observe`] is how code outside the engine watches pollers, caches and
//! broadcasters at work. Register observers on a [`Telemetry`](crate::Telemetry);
//! each one is fed from its own bounded queue by its own task, so a slow or
//! panicking observer only ever hurts itself.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use pollcast::{Event, EventKind, Observe};
//!
//! #[derive(Default)]
//! struct FailureCount(AtomicU64);
//!
//! #[async_trait]
//! impl Observe for FailureCount {
//!     async fn on_event(&self, _ev: &Event) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//!
//!     fn interested(&self, kind: EventKind) -> bool {
//!         matches!(kind, EventKind::ProduceFailed | EventKind::TimeoutHit)
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Receiver of engine events.
///
/// `on_event` runs on a task owned by the [`ObserverSet`](crate::ObserverSet),
/// one event at a time and in publication order. Do not block the executor in it.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Label used as `source` when this observer overflows or panics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether events of `kind` should be queued for this observer at all.
    ///
    /// Events filtered out here never occupy queue space and never count as overflow.
    fn interested(&self, _kind: EventKind) -> bool {
        true
    }

    /// Queue length before events are dropped for this observer (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
