//! # ObserverSet: per-observer delivery lanes.
//!
//! Every registered observer owns a *lane*: a bounded queue plus the task that
//! drains it into [`Observe::on_event`]. [`ObserverSet::emit`] only enqueues, so
//! the telemetry listener never waits on an observer.
//!
//! ```text
//! emit(ev) ─┬─ interested? ─► lane "log"     [queue] ─► task ─► on_event
//!           ├─ interested? ─► lane "metrics" [queue] ─► task ─► on_event
//!           └─ not interested: skipped
//!
//! queue full/closed ─► ObserverOverflow { source: lane name } on the bus
//! on_event panics   ─► ObserverPanicked { source: lane name } on the bus, lane keeps going
//! ```
//!
//! Lanes are independent: each sees its events in publication order, but two
//! lanes may be arbitrarily far apart. A panic is caught with `AssertUnwindSafe`,
//! so an observer that panics while holding a lock may leave that state poisoned.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::observers::Observe;

struct Lane {
    observer: Arc<dyn Observe>,
    queue: mpsc::Sender<Arc<Event>>,
    task: JoinHandle<()>,
}

impl Lane {
    fn open(observer: Arc<dyn Observe>, bus: Bus) -> Self {
        let (queue, rx) = mpsc::channel(observer.queue_capacity().max(1));
        let task = tokio::spawn(serve(Arc::clone(&observer), rx, bus));
        Self {
            observer,
            queue,
            task,
        }
    }

    /// Queues `event`; returns why it was dropped, if it was.
    fn offer(&self, event: &Arc<Event>) -> Option<&'static str> {
        match self.queue.try_send(Arc::clone(event)) {
            Ok(()) => None,
            Err(TrySendError::Full(_)) => Some("full"),
            Err(TrySendError::Closed(_)) => Some("closed"),
        }
    }
}

async fn serve(observer: Arc<dyn Observe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(event) = rx.recv().await {
        let handled = AssertUnwindSafe(observer.on_event(&event)).catch_unwind().await;
        if let Err(payload) = handled {
            bus.publish(Event::observer_panicked(
                observer.name(),
                panic_message(&*payload),
            ));
        }
    }
}

/// The observers attached to one [`Telemetry`](crate::Telemetry).
pub struct ObserverSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl ObserverSet {
    /// Opens one lane per observer. Must be called inside a tokio runtime.
    ///
    /// `bus` receives the overflow and panic reports of every lane.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>, bus: Bus) -> Self {
        let lanes = observers
            .into_iter()
            .map(|observer| Lane::open(observer, bus.clone()))
            .collect();
        Self { lanes, bus }
    }

    /// Number of observers.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// `true` when no observer is attached.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Queues `event` for every interested observer without waiting.
    ///
    /// A lane that cannot take the event drops it and an `ObserverOverflow`
    /// naming that lane is published. Overflow reports are never themselves
    /// reported when they overflow.
    pub fn emit(&self, event: Arc<Event>) {
        for lane in &self.lanes {
            if !lane.observer.interested(event.kind) {
                continue;
            }
            if let Some(reason) = lane.offer(&event) {
                if !event.is_observer_overflow() {
                    self.bus
                        .publish(Event::observer_overflow(lane.observer.name(), reason));
                }
            }
        }
    }

    /// Closes every lane and waits until each has handled what it had queued.
    pub async fn shutdown(self) {
        let tasks: Vec<JoinHandle<()>> = self
            .lanes
            .into_iter()
            .map(|Lane { queue, task, .. }| {
                drop(queue);
                task
            })
            .collect();
        for task in tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        seen: Arc<AtomicUsize>,
        only: Option<EventKind>,
        capacity: usize,
    }

    impl Counter {
        fn all(seen: &Arc<AtomicUsize>) -> Arc<Self> {
            Arc::new(Self {
                seen: seen.clone(),
                only: None,
                capacity: 16,
            })
        }
    }

    #[async_trait]
    impl Observe for Counter {
        async fn on_event(&self, _ev: &Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
        fn interested(&self, kind: EventKind) -> bool {
            self.only.map_or(true, |only| only == kind)
        }
        fn queue_capacity(&self) -> usize {
            self.capacity
        }
    }

    struct Panicky;

    #[async_trait]
    impl Observe for Panicky {
        async fn on_event(&self, _ev: &Event) {
            panic!("observer blew up");
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_every_observer() {
        let seen = Arc::new(AtomicUsize::new(0));
        let observers: Vec<Arc<dyn Observe>> = vec![Counter::all(&seen), Counter::all(&seen)];
        let set = ObserverSet::new(observers, Bus::new(16));
        assert_eq!(set.len(), 2);

        set.emit(Arc::new(Event::new(EventKind::PollerStopped)));
        set.shutdown().await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_uninterested_observer_is_skipped() {
        let seen = Arc::new(AtomicUsize::new(0));
        let picky: Arc<dyn Observe> = Arc::new(Counter {
            seen: seen.clone(),
            only: Some(EventKind::ProduceFailed),
            capacity: 1,
        });
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = ObserverSet::new(vec![picky], bus);

        for _ in 0..3 {
            set.emit(Arc::new(Event::new(EventKind::ResultBroadcast)));
        }
        set.emit(Arc::new(Event::new(EventKind::ProduceFailed)));
        set.shutdown().await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err(), "skipped events are not overflow");
    }

    #[tokio::test]
    async fn test_full_lane_reports_overflow_by_name() {
        let seen = Arc::new(AtomicUsize::new(0));
        let narrow: Arc<dyn Observe> = Arc::new(Counter {
            seen: seen.clone(),
            only: None,
            capacity: 1,
        });
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = ObserverSet::new(vec![narrow], bus);

        // The lane task has not run yet, so the second event finds the queue full.
        set.emit(Arc::new(Event::new(EventKind::PollerStopped)));
        set.emit(Arc::new(Event::new(EventKind::PollerStopped)));

        let ev = rx.try_recv().expect("overflow event");
        assert_eq!(ev.kind, EventKind::ObserverOverflow);
        assert_eq!(ev.source.as_deref(), Some("counter"));
        assert!(ev.reason.as_deref().is_some_and(|r| r.contains("full")));

        set.shutdown().await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panic_is_reported_on_bus() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let panicky: Arc<dyn Observe> = Arc::new(Panicky);
        let set = ObserverSet::new(vec![panicky], bus.clone());

        set.emit(Arc::new(Event::new(EventKind::PollerStopped)));
        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::ObserverPanicked);
        assert_eq!(ev.source.as_deref(), Some("panicky"));
        assert_eq!(ev.reason.as_deref(), Some("observer blew up"));
        set.shutdown().await;
    }
}
