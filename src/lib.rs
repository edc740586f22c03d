//! # pollcast
//!
//! **Pollcast** keeps slow upstream data fresh in-process: it re-fetches a value
//! from a producer on a fixed interval, caches the last good result so transient
//! failures don't blank out known data, and fans results out to a dynamic set of
//! subscribers behind change filters.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 ┌──────────────────────────┐
//!                 │ Producer (user-supplied) │
//!                 │  produce() -> Option<V>  │
//!                 └────────────┬─────────────┘
//!                              ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Poller                                                       │
//! │  - tick loop: one new concurrent invocation per interval      │
//! │  - run_once: timeout, panic capture, lifecycle events         │
//! │  - result queue ─► single consumption task ─► Actor::recv     │
//! └──────────────┬─────────────────────────────────┬──────────────┘
//!                ▼                                 ▼
//!     ┌─────────────────────┐           ┌──────────────────────┐
//!     │ Precacher           │           │ Broadcaster          │
//!     │ Arc<CacheEntry> swap│           │ lock(subs) ─► send   │
//!     └──────────┬──────────┘           └──┬────────┬───────┬──┘
//!                ▼                         ▼        ▼       ▼
//!        results() / get()              sink   ChangeFilter sink
//!        latest()                                   ▼
//!                                                  sink
//!
//! every component ── publish(Event) ──► Bus ──► Telemetry ──► ObserverSet ──► LogWriter / custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! spawn ──► first invocation immediately
//!   loop every interval:
//!     ├─► cycle += 1, spawn run_once(producer)
//!     │       ├─ Ok(Some(v)) ─► PollResult{ value: v }
//!     │       ├─ Ok(None)    ─► PollResult{ value: absent }
//!     │       └─ Err / panic / timeout ─► PollResult{ error }
//!     └─► result ─► actor.recv (completion order)
//!
//! stop():
//!   ├─► tick loop and consumption task exit
//!   ├─► in-flight invocations finish; their results are dropped (ResultDropped)
//!   └─► Precacher keeps serving; Streamer closes every subscriber sink once
//! ```
//!
//! ## Features
//! | Area              | Description                                                           | Key types                             |
//! |-------------------|-----------------------------------------------------------------------|---------------------------------------|
//! | **Producers**     | Typed value sources, closure adapter                                  | [`Producer`], [`ProducerFn`]          |
//! | **Caching**       | Last-known-good value with latest error, `CacheEmpty` before first use | [`Precacher`], [`CacheEntry`]         |
//! | **Streaming**     | Cancellable subscriptions, exactly-once close                         | [`Streamer`], [`Broadcaster`]         |
//! | **Change filters**| Field-subset equality and tri-state session continuity                | [`ChangeFilter`], [`Equivalence`]     |
//! | **Observability** | Injected event bus and observer fan-out                               | [`Bus`], [`Telemetry`], [`Observe`]   |
//! | **Logging**       | `tracing`-backed observer *(feature `logging`)*                       | `LogWriter`                           |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`] (enabled by default).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use pollcast::{
//!     ChangeFilter, Equal, Observe, PollerConfig, Precacher, ProducerError, ProducerFn,
//!     Streamer, StreamerConfig, Telemetry,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let observers: Vec<Arc<dyn Observe>> = Vec::new();
//! let telemetry = Telemetry::builder().with_observers(observers).build();
//!
//! let location = ProducerFn::arc("location", || async {
//!     Ok::<_, ProducerError>(Some("Toronto, ON".to_string()))
//! });
//!
//! let mut cache_cfg = PollerConfig::named("location-cache");
//! cache_cfg.interval = Duration::from_secs(120);
//! let cache = Precacher::builder(location.clone())
//!     .config(cache_cfg)
//!     .bus(telemetry.bus())
//!     .spawn()?;
//!
//! let mut stream_cfg = StreamerConfig::default();
//! stream_cfg.poller.name = "location-stream".into();
//! let streamer = Streamer::builder(location)
//!     .config(stream_cfg)
//!     .bus(telemetry.bus())
//!     .spawn()?;
//!
//! let token = CancellationToken::new();
//! let mut updates = streamer
//!     .subscribe_filtered(token.clone(), ChangeFilter::new(Equal))
//!     .await;
//! if let Some(update) = updates.recv().await {
//!     println!("location: {:?}", update.get());
//! }
//! println!("cached: {:?}", cache.latest());
//!
//! token.cancel();
//! streamer.stop().await;
//! cache.stop();
//! telemetry.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod core;
mod error;
mod events;
mod filters;
mod observers;
mod producers;

pub mod domain;

// ---- Public re-exports ----

pub use config::{PollerConfig, StreamerConfig};
pub use crate::core::{
    run_once, Actor, Broadcaster, CacheEntry, Poller, Precacher, PrecacherBuilder, Streamer,
    StreamerBuilder, SubscriberId,
};
pub use error::{ConfigError, PollError, ProducerError};
pub use events::{Bus, Event, EventKind};
pub use filters::{ChangeFilter, Continuity, Equal, Equivalence, SameBy, Session};
pub use observers::{Observe, ObserverSet, Telemetry, TelemetryBuilder};
pub use producers::{PollResult, ProduceFuture, Producer, ProducerFn, ProducerRef};

// Optional: a built-in observer that renders events through `tracing`.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use observers::LogWriter;
