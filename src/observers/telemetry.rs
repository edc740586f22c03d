//! # Telemetry: bus ownership and observer wiring.
//!
//! [`Telemetry`] creates the [`Bus`] handed to engine components and runs one
//! listener that forwards every bus event into an [`ObserverSet`].
//!
//! ```text
//! Poller/Precacher/Broadcaster ── publish ──► Bus ──► listener ──► ObserverSet::emit
//!                                                                    ├─► LogWriter
//!                                                                    └─► custom observers
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pollcast::{Observe, Telemetry};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let observers: Vec<Arc<dyn Observe>> = Vec::new();
//! let telemetry = Telemetry::builder()
//!     .bus_capacity(256)
//!     .with_observers(observers)
//!     .build();
//!
//! let bus = telemetry.bus(); // pass to Precacher / Streamer builders
//! # drop(bus);
//! telemetry.shutdown().await;
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event};
use crate::observers::{Observe, ObserverSet};

/// Owner of the event bus and its observer fan-out.
pub struct Telemetry {
    bus: Bus,
    token: CancellationToken,
    listener: JoinHandle<()>,
}

impl Telemetry {
    /// Returns a builder with default settings (capacity 1024, no observers).
    pub fn builder() -> TelemetryBuilder {
        TelemetryBuilder::new()
    }

    /// Returns a handle to the bus; cheap to clone.
    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    /// Stops the listener and waits for every observer to drain its queue.
    ///
    /// Events already published to the bus when this is called still reach the
    /// observers; events published afterwards do not.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.listener.await;
    }
}

/// Builder for [`Telemetry`].
pub struct TelemetryBuilder {
    capacity: usize,
    observers: Vec<Arc<dyn Observe>>,
}

impl TelemetryBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            capacity: 1024,
            observers: Vec::new(),
        }
    }

    /// Sets the bus ring buffer capacity (min 1).
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets event observers.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds a single observer.
    pub fn observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the bus and spawns the listener. Must be called inside a tokio runtime.
    pub fn build(self) -> Telemetry {
        let bus = Bus::new(self.capacity);
        let set = ObserverSet::new(self.observers, bus.clone());
        let token = CancellationToken::new();

        let mut rx = bus.subscribe();
        let stop = token.clone();
        let listener = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(Arc::new(ev)),
                        Err(RecvError::Lagged(_)) => set.emit(Arc::new(lagged())),
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            drain(&mut rx, &set);
            set.shutdown().await;
        });

        Telemetry {
            bus,
            token,
            listener,
        }
    }
}

/// Forwards whatever is still buffered in `rx` without waiting for more.
fn drain(rx: &mut broadcast::Receiver<Event>, set: &ObserverSet) {
    loop {
        match rx.try_recv() {
            Ok(ev) => set.emit(Arc::new(ev)),
            Err(TryRecvError::Lagged(_)) => set.emit(Arc::new(lagged())),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn lagged() -> Event {
    Event::observer_overflow("telemetry", "lagged")
}

impl Default for TelemetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Observe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().push(ev.kind);
        }
    }

    #[tokio::test]
    async fn test_bus_events_reach_observers() {
        let rec = Arc::new(Recorder::default());
        let telemetry = Telemetry::builder().observer(rec.clone()).build();

        telemetry
            .bus()
            .publish(Event::new(EventKind::SubscriberAdded).with_subscriber(1));

        for _ in 0..100 {
            if !rec.0.lock().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        telemetry.shutdown().await;
        assert_eq!(rec.0.lock().as_slice(), &[EventKind::SubscriberAdded]);
    }

    #[tokio::test]
    async fn test_shutdown_forwards_already_published_events() {
        let rec = Arc::new(Recorder::default());
        let telemetry = Telemetry::builder().observer(rec.clone()).build();
        tokio::task::yield_now().await;

        let bus = telemetry.bus();
        bus.publish(Event::new(EventKind::PollerStopped).with_source("p"));
        bus.publish(Event::new(EventKind::BroadcasterClosed).with_source("p"));
        telemetry.shutdown().await;

        assert_eq!(
            rec.0.lock().as_slice(),
            &[EventKind::PollerStopped, EventKind::BroadcasterClosed]
        );
    }

    #[tokio::test]
    async fn test_lag_is_reported_as_overflow_on_shutdown() {
        let rec = Arc::new(Recorder::default());
        let telemetry = Telemetry::builder()
            .bus_capacity(2)
            .observer(rec.clone())
            .build();

        let bus = telemetry.bus();
        for _ in 0..5 {
            bus.publish(Event::new(EventKind::ResultBroadcast));
        }
        telemetry.shutdown().await;

        let kinds = rec.0.lock().clone();
        assert_eq!(kinds.first(), Some(&EventKind::ObserverOverflow));
        assert_eq!(&kinds[1..], &[EventKind::ResultBroadcast, EventKind::ResultBroadcast]);
    }
}
