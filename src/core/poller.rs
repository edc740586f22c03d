//! # Poller: periodic producer invocation feeding one actor.
//!
//! ## Architecture
//! ```text
//! Poller::spawn(producer, actor, cfg, bus)
//!
//! tick loop (1 task)                  invocations (1 task per tick)
//!   interval.tick() ─── spawn ──────► run_once(producer) ──┐
//!   interval.tick() ─── spawn ──────► run_once(producer) ──┤ select! { send, stop }
//!   ...                                                    ▼
//!                                            [bounded result queue]
//!                                                          ▼
//!                                 consumption task (1 task): actor.recv(result)
//! ```
//!
//! ## Rules
//! - The first invocation starts immediately; no cold-start wait.
//! - Each tick starts a **new** invocation; invocations are never serialized, so
//!   several may be in flight when the producer is slower than the interval.
//! - Results reach the actor in **completion** order; no ordering across
//!   overlapping cycles is promised.
//! - `stop()` is idempotent and safe to call concurrently. It halts the tick loop and
//!   the consumption task at once; in-flight invocations run to completion and their
//!   results are discarded (`ResultDropped`) instead of blocking forever.
//! - The poller never filters, retries or suppresses producer errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::PollerConfig,
    core::{actor::Actor, runner::run_once},
    error::ConfigError,
    events::{Bus, Event, EventKind},
    producers::{PollResult, Producer},
};

/// Drives a [`Producer`] on a fixed interval and feeds every result to one [`Actor`].
///
/// Dropping a `Poller` stops it.
pub struct Poller {
    name: Arc<str>,
    bus: Bus,
    token: CancellationToken,
    stopped: AtomicBool,
    ticker: Option<JoinHandle<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl Poller {
    /// Validates `cfg` and starts polling immediately.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn<P, A>(
        producer: Arc<P>,
        actor: A,
        cfg: &PollerConfig,
        bus: Bus,
    ) -> Result<Self, ConfigError>
    where
        P: Producer + ?Sized,
        A: Actor<P::Value>,
    {
        cfg.validate()?;

        let name: Arc<str> = Arc::from(&*cfg.name);
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(cfg.result_capacity_clamped());

        let consumer = tokio::spawn(consume_loop(actor, rx, token.clone()));
        let ticker = tokio::spawn(tick_loop(
            producer,
            tx,
            Schedule {
                source: name.clone(),
                interval: cfg.interval,
                timeout: cfg.invocation_timeout(),
            },
            token.clone(),
            bus.clone(),
        ));

        Ok(Self {
            name,
            bus,
            token,
            stopped: AtomicBool::new(false),
            ticker: Some(ticker),
            consumer: Some(consumer),
        })
    }

    /// Returns the source label of this poller.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops ticking and consuming. Later calls are no-ops.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.token.cancel();
        self.bus
            .publish(Event::new(EventKind::PollerStopped).with_source(self.name.clone()));
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stops the poller and waits for its background tasks to exit.
    ///
    /// Does not wait for in-flight producer invocations.
    pub async fn shutdown(mut self) {
        self.stop();
        for handle in [self.ticker.take(), self.consumer.take()].into_iter().flatten() {
            let _ = handle.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("name", &self.name)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Timing parameters shared by the tick loop and every invocation.
#[derive(Clone)]
struct Schedule {
    source: Arc<str>,
    interval: Duration,
    timeout: Option<Duration>,
}

async fn tick_loop<P>(
    producer: Arc<P>,
    tx: mpsc::Sender<PollResult<P::Value>>,
    schedule: Schedule,
    token: CancellationToken,
    bus: Bus,
) where
    P: Producer + ?Sized,
{
    let mut ticker = time::interval(schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        cycle += 1;
        tokio::spawn(invoke_and_deliver(
            producer.clone(),
            tx.clone(),
            schedule.clone(),
            cycle,
            token.clone(),
            bus.clone(),
        ));
    }
}

async fn invoke_and_deliver<P>(
    producer: Arc<P>,
    tx: mpsc::Sender<PollResult<P::Value>>,
    schedule: Schedule,
    cycle: u64,
    token: CancellationToken,
    bus: Bus,
) where
    P: Producer + ?Sized,
{
    let result = run_once(
        producer.as_ref(),
        &schedule.source,
        cycle,
        schedule.timeout,
        &bus,
    )
    .await;

    let delivered = tokio::select! {
        biased;
        _ = token.cancelled() => false,
        sent = tx.send(result) => sent.is_ok(),
    };
    if !delivered {
        bus.publish(
            Event::new(EventKind::ResultDropped)
                .with_source(schedule.source)
                .with_cycle(cycle),
        );
    }
}

async fn consume_loop<V, A>(
    mut actor: A,
    mut rx: mpsc::Receiver<PollResult<V>>,
    token: CancellationToken,
) where
    V: Send + Sync + 'static,
    A: Actor<V>,
{
    loop {
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(result) => result,
                None => break,
            },
        };
        actor.recv(result).await;
    }
}
