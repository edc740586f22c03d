//! Engine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/observe events emitted by pollers, precachers and broadcasters.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Poller`, producer invocations, `Precacher`'s cache actor,
//!   `Broadcaster`, `ObserverSet` workers (overflow/panic).
//! - **Consumers**: the `Telemetry` listener (fans out to `ObserverSet`), or any
//!   receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
