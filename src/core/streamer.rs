//! # Streamer: a poller feeding a broadcaster.
//!
//! Serves live-updating streams of a producer's results to any number of callers,
//! each bound to its own cancellation token and optionally behind a
//! [`ChangeFilter`].
//!
//! ```text
//! Producer ─► Poller ─► Broadcaster ─┬─► sink (stream_current / subscribe)
//!                                    └─► sink ─► ChangeFilter ─► rx (subscribe_filtered)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use pollcast::{Equal, ChangeFilter, ProducerError, ProducerFn, Streamer, StreamerConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let temps = ProducerFn::arc("thermometer", || async { Ok::<_, ProducerError>(Some(21u8)) });
//!
//! let mut cfg = StreamerConfig::default();
//! cfg.poller.interval = Duration::from_millis(100);
//! let streamer = Streamer::builder(temps).config(cfg).spawn()?;
//!
//! let token = CancellationToken::new();
//! let mut rx = streamer
//!     .subscribe_filtered(token.clone(), ChangeFilter::new(Equal))
//!     .await;
//! if let Some(first) = rx.recv().await {
//!     println!("temperature: {:?}", first.get());
//! }
//! token.cancel();
//! streamer.stop().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::StreamerConfig,
    core::{
        broadcaster::{Broadcaster, SubscriberId},
        poller::Poller,
    },
    error::ConfigError,
    events::Bus,
    filters::{ChangeFilter, Equivalence},
    producers::{PollResult, Producer},
};

/// Live stream of a producer's results to a dynamic set of subscribers.
///
/// Dropping a `Streamer` stops polling and closes every subscriber stream.
pub struct Streamer<V> {
    poller: Poller,
    hub: Broadcaster<V>,
    sink_capacity: usize,
}

impl<V> Streamer<V>
where
    V: Send + Sync + 'static,
{
    /// Starts building a streamer over `producer`.
    pub fn builder<P>(producer: Arc<P>) -> StreamerBuilder<P>
    where
        P: Producer<Value = V> + ?Sized,
    {
        StreamerBuilder::new(producer)
    }

    /// Sends every future result into `sink` until `token` is cancelled or the
    /// streamer stops, then drops `sink`.
    ///
    /// Returns `None` (and drops `sink`) if the streamer is already stopped.
    pub async fn stream_current(
        &self,
        token: CancellationToken,
        sink: mpsc::Sender<PollResult<V>>,
    ) -> Option<SubscriberId> {
        self.hub.stream_current(token, sink).await
    }

    /// Opens an unfiltered stream bound to `token`.
    ///
    /// The receiver yields `None` once `token` fires or the streamer stops.
    pub async fn subscribe(&self, token: CancellationToken) -> mpsc::Receiver<PollResult<V>> {
        let (tx, rx) = mpsc::channel(self.sink_capacity);
        self.stream_current(token, tx).await;
        rx
    }

    /// Opens a stream bound to `token` that only yields meaningful changes.
    pub async fn subscribe_filtered<Q>(
        &self,
        token: CancellationToken,
        filter: ChangeFilter<V, Q>,
    ) -> mpsc::Receiver<PollResult<V>>
    where
        Q: Equivalence<V>,
    {
        let upstream = self.subscribe(token).await;
        let (tx, rx) = mpsc::channel(self.sink_capacity);
        filter.spawn(upstream, tx);
        rx
    }

    /// Returns the number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count().await
    }

    /// Returns the underlying broadcaster for manual `add_sub`/`del_sub`.
    pub fn broadcaster(&self) -> &Broadcaster<V> {
        &self.hub
    }

    /// Stops polling, then closes every subscriber stream. Idempotent.
    pub async fn stop(&self) {
        self.poller.stop();
        self.hub.close().await;
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.poller.is_stopped()
    }
}

impl<V> Drop for Streamer<V> {
    fn drop(&mut self) {
        self.poller.stop();
        self.hub.close_detached();
    }
}

/// Builder for [`Streamer`].
pub struct StreamerBuilder<P: ?Sized> {
    producer: Arc<P>,
    cfg: StreamerConfig,
    bus: Bus,
}

impl<P> StreamerBuilder<P>
where
    P: Producer + ?Sized,
{
    /// Creates a builder with default config and a bus nobody listens to.
    pub fn new(producer: Arc<P>) -> Self {
        let mut cfg = StreamerConfig::default();
        cfg.poller.name = producer.name().to_string().into();
        Self {
            producer,
            cfg,
            bus: Bus::default(),
        }
    }

    /// Sets the streamer configuration.
    pub fn config(mut self, cfg: StreamerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the event bus used for logging.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = bus;
        self
    }

    /// Validates the config and starts polling. Must be called inside a tokio runtime.
    pub fn spawn(self) -> Result<Streamer<P::Value>, ConfigError> {
        self.cfg.validate()?;
        let hub = Broadcaster::new(&*self.cfg.poller.name, self.bus.clone());
        let poller = Poller::spawn(self.producer, hub.clone(), &self.cfg.poller, self.bus)?;
        Ok(Streamer {
            poller,
            hub,
            sink_capacity: self.cfg.sink_capacity_clamped(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProducerError;
    use crate::filters::Equal;
    use crate::producers::ProducerFn;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tokio::time;

    fn counter() -> Arc<impl Producer<Value = u64>> {
        let n = Arc::new(AtomicU64::new(0));
        ProducerFn::arc("counter", move || {
            let v = n.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, ProducerError>(Some(v)) }
        })
    }

    fn constant() -> Arc<impl Producer<Value = u64>> {
        ProducerFn::arc("constant", || async { Ok::<_, ProducerError>(Some(1u64)) })
    }

    fn every(ms: u64) -> StreamerConfig {
        let mut cfg = StreamerConfig::default();
        cfg.poller.interval = Duration::from_millis(ms);
        cfg.sink_capacity = 4;
        cfg
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_receive_stream() {
        let streamer = Streamer::builder(counter()).config(every(100)).spawn().expect("valid");
        let mut rx = streamer.subscribe(CancellationToken::new()).await;

        let a = rx.recv().await.expect("a");
        let b = rx.recv().await.expect("b");
        assert!(b.cycle > a.cycle);
        streamer.stop().await;
        while rx.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_filtered_stream_suppresses_repeats() {
        let streamer = Streamer::builder(constant()).config(every(100)).spawn().expect("valid");
        let token = CancellationToken::new();
        let mut rx = streamer
            .subscribe_filtered(token.clone(), ChangeFilter::new(Equal))
            .await;

        assert_eq!(rx.recv().await.expect("first").get(), Some(&1));
        let quiet = time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(quiet.is_err(), "repeated value must be suppressed");

        token.cancel();
        assert!(rx.recv().await.is_none());
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(streamer.subscriber_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_closes_streams_and_rejects_new_ones() {
        let streamer = Streamer::builder(counter()).config(every(100)).spawn().expect("valid");
        let mut rx = streamer.subscribe(CancellationToken::new()).await;
        rx.recv().await.expect("first");

        streamer.stop().await;
        streamer.stop().await;
        assert!(streamer.is_stopped());
        while rx.recv().await.is_some() {}

        let mut late = streamer.subscribe(CancellationToken::new()).await;
        assert!(late.recv().await.is_none());
    }
}
