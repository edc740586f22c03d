//! # Run a single producer invocation.
//!
//! Executes one [`Producer::produce`] call with optional timeout and panic capture,
//! publishes lifecycle events to the [`Bus`], and converts the outcome into a
//! [`PollResult`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   ProduceStarted → produce() → Ok(..) → ProduceCompleted
//!
//! Failure / panic:
//!   ProduceStarted → produce() → Err / panic → ProduceFailed
//!
//! Timeout:
//!   ProduceStarted → timeout exceeded → TimeoutHit → ProduceFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `ProduceCompleted` or `ProduceFailed`
//! - `TimeoutHit` is published **in addition to** `ProduceFailed` on timeout
//! - A timed-out future is dropped; the producer sees cancellation by drop

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};

use crate::{
    error::{panic_message, ProducerError},
    events::{Bus, Event, EventKind},
    producers::{PollResult, Producer},
};

/// Runs one invocation of `producer` for `cycle`, publishing events to `bus`.
pub async fn run_once<P>(
    producer: &P,
    source: &str,
    cycle: u64,
    timeout: Option<Duration>,
    bus: &Bus,
) -> PollResult<P::Value>
where
    P: Producer + ?Sized,
{
    bus.publish(
        Event::new(EventKind::ProduceStarted)
            .with_source(source)
            .with_cycle(cycle),
    );
    let started = Instant::now();
    let fut = AssertUnwindSafe(producer.produce()).catch_unwind();

    let produced = if let Some(dur) = timeout {
        match time::timeout(dur, fut).await {
            Ok(caught) => flatten(caught),
            Err(_elapsed) => {
                bus.publish(
                    Event::new(EventKind::TimeoutHit)
                        .with_source(source)
                        .with_cycle(cycle)
                        .with_timeout(dur),
                );
                Err(ProducerError::Timeout { timeout: dur })
            }
        }
    } else {
        flatten(fut.await)
    };

    let elapsed = started.elapsed();
    match &produced {
        Ok(_) => bus.publish(
            Event::new(EventKind::ProduceCompleted)
                .with_source(source)
                .with_cycle(cycle)
                .with_elapsed(elapsed),
        ),
        Err(e) => bus.publish(
            Event::new(EventKind::ProduceFailed)
                .with_source(source)
                .with_cycle(cycle)
                .with_elapsed(elapsed)
                .with_reason(e.to_string()),
        ),
    }
    PollResult::from_produced(cycle, produced)
}

type Caught<V> = Result<Result<Option<V>, ProducerError>, Box<dyn std::any::Any + Send>>;

fn flatten<V>(caught: Caught<V>) -> Result<Option<V>, ProducerError> {
    caught.unwrap_or_else(|panic| {
        Err(ProducerError::Panicked {
            info: panic_message(&*panic),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producers::ProducerFn;

    #[tokio::test]
    async fn test_success_publishes_started_and_completed() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let p = ProducerFn::new("ok", || async { Ok::<_, ProducerError>(Some(7u8)) });

        let res = run_once(&p, "ok", 1, None, &bus).await;
        assert_eq!(res.get(), Some(&7));
        assert_eq!(rx.recv().await.expect("ev").kind, EventKind::ProduceStarted);
        assert_eq!(rx.recv().await.expect("ev").kind, EventKind::ProduceCompleted);
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let bus = Bus::new(16);
        let p = ProducerFn::new("panics", || async {
            if true {
                panic!("upstream exploded");
            }
            Ok::<Option<u8>, ProducerError>(None)
        });

        let res = run_once(&p, "panics", 4, None, &bus).await;
        assert_eq!(
            res.error,
            Some(ProducerError::Panicked {
                info: "upstream exploded".into()
            })
        );
        assert_eq!(res.cycle, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_error() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let p = ProducerFn::new("slow", || async {
            time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ProducerError>(Some(1u8))
        });

        let res = run_once(&p, "slow", 1, Some(Duration::from_secs(1)), &bus).await;
        assert_eq!(
            res.error,
            Some(ProducerError::Timeout {
                timeout: Duration::from_secs(1)
            })
        );

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ProduceStarted,
                EventKind::TimeoutHit,
                EventKind::ProduceFailed
            ]
        );
    }
}
