//! # Event observers for the polling engine.
//!
//! This module provides the [`Observe`] trait and the machinery that delivers
//! engine events broadcast through the [`Bus`](crate::Bus) to observers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Poller/Precacher/Broadcaster ── publish(Event) ──► Bus ──► Telemetry listener
//!                                                                  │
//!                                                           ObserverSet::emit
//!                                                        ┌─────────┼─────────┐
//!                                                        ▼         ▼         ▼
//!                                                    LogWriter  Metrics   Custom
//! ```
//!
//! Logging is an injected capability: build a [`Telemetry`] with a [`LogWriter`]
//! and hand its bus to each component. There is no process-wide default logger.

#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;
mod telemetry;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub use set::ObserverSet;
pub use telemetry::{Telemetry, TelemetryBuilder};
