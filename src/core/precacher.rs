//! # Precacher: last-known-good value cache fed by a poller.
//!
//! Answers "what is the most recent known-good value?" without waiting on the
//! producer, and without losing that value when the producer starts failing.
//!
//! ## Cache rules
//! ```text
//! delivery           cached value         cached error
//! ───────────────    ──────────────────   ────────────
//! Ok(Some(v))        v                    none
//! Ok(None)           unchanged            none
//! Err(e)             unchanged            e
//! ```
//! - Before the first delivery, [`Precacher::results`] returns [`PollError::CacheEmpty`].
//! - After it, the cache is never empty again; a producer cannot clear a cached value.
//! - Stopping does not invalidate the cache.
//!
//! ## Concurrency
//! The poller's consumption task is the only writer. Each delivery builds a new
//! immutable [`CacheEntry`] and swaps the `Arc` in under a short write lock; readers
//! clone the `Arc` and never observe a half-written entry.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pollcast::{Bus, PollerConfig, Precacher, ProducerError, ProducerFn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let commits = ProducerFn::arc("commits", || async {
//!     Ok::<_, ProducerError>(Some(vec!["a1b2c3".to_string()]))
//! });
//!
//! let mut cfg = PollerConfig::named("commits");
//! cfg.interval = Duration::from_secs(600);
//!
//! let cache = Precacher::builder(commits).config(cfg).bus(Bus::default()).spawn()?;
//! match cache.results() {
//!     Ok(entry) => println!("cached: {:?} (error: {:?})", entry.value, entry.error),
//!     Err(e) if e.is_cache_empty() => println!("not fetched yet"),
//!     Err(e) => return Err(e.into()),
//! }
//! cache.stop();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    config::PollerConfig,
    core::{actor::Actor, poller::Poller},
    error::{ConfigError, PollError, ProducerError},
    events::{Bus, Event, EventKind},
    producers::{PollResult, Producer},
};

/// Immutable snapshot of a precacher's state.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// Last non-absent value ever delivered (or the initial value).
    pub value: Option<Arc<V>>,
    /// Error carried by the most recent delivery.
    pub error: Option<ProducerError>,
    /// Cycle of the most recent delivery (`0` for an initial value).
    pub cycle: u64,
    /// When the most recent delivery was applied.
    pub updated_at: SystemTime,
}

impl<V> CacheEntry<V> {
    /// Borrows the cached value, if any.
    #[inline]
    pub fn get(&self) -> Option<&V> {
        self.value.as_deref()
    }

    /// Returns `true` if the most recent delivery failed.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.error.is_some()
    }
}

/// Shared slot holding the latest entry.
struct Cache<V> {
    slot: RwLock<Option<Arc<CacheEntry<V>>>>,
}

impl<V> Cache<V> {
    fn snapshot(&self) -> Option<Arc<CacheEntry<V>>> {
        self.slot.read().clone()
    }
}

/// Actor applying deliveries to the cache.
struct CacheActor<V> {
    cache: Arc<Cache<V>>,
    source: Arc<str>,
    bus: Bus,
}

#[async_trait]
impl<V> Actor<V> for CacheActor<V>
where
    V: Send + Sync + 'static,
{
    async fn recv(&mut self, result: PollResult<V>) {
        let PollResult {
            value,
            error,
            cycle,
        } = result;

        let kind = if value.is_some() {
            EventKind::CacheStored
        } else {
            EventKind::CacheRetained
        };
        let value = value.or_else(|| self.cache.snapshot().and_then(|e| e.value.clone()));

        let mut ev = Event::new(kind)
            .with_source(self.source.clone())
            .with_cycle(cycle);
        if let Some(e) = &error {
            ev = ev.with_reason(e.to_string());
        }

        let entry = Arc::new(CacheEntry {
            value,
            error,
            cycle,
            updated_at: SystemTime::now(),
        });
        *self.cache.slot.write() = Some(entry);
        self.bus.publish(ev);
    }
}

/// Caches the values produced by a [`Producer`] at a regular interval.
pub struct Precacher<V> {
    poller: Poller,
    cache: Arc<Cache<V>>,
}

impl<V> Precacher<V>
where
    V: Send + Sync + 'static,
{
    /// Starts building a precacher over `producer`.
    pub fn builder<P>(producer: Arc<P>) -> PrecacherBuilder<P>
    where
        P: Producer<Value = V> + ?Sized,
    {
        PrecacherBuilder::new(producer)
    }

    /// Returns the latest cache entry.
    ///
    /// `Err(PollError::CacheEmpty)` until the first delivery. Afterwards the entry
    /// may carry both a value and an error: stale data under a live fault.
    pub fn results(&self) -> Result<Arc<CacheEntry<V>>, PollError> {
        self.cache.snapshot().ok_or(PollError::CacheEmpty)
    }

    /// Strict view: the latest error wins over a stale value.
    pub fn get(&self) -> Result<Option<Arc<V>>, PollError> {
        let entry = self.results()?;
        match &entry.error {
            Some(e) => Err(PollError::Producer(e.clone())),
            None => Ok(entry.value.clone()),
        }
    }

    /// Lenient view: the last known value, regardless of the latest error.
    pub fn latest(&self) -> Option<Arc<V>> {
        self.cache.snapshot().and_then(|e| e.value.clone())
    }

    /// Stops requesting new values. The cache keeps serving its last entry.
    pub fn stop(&self) {
        self.poller.stop();
    }

    /// Returns `true` once the underlying poller has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.poller.is_stopped()
    }
}

/// Builder for [`Precacher`].
pub struct PrecacherBuilder<P: Producer + ?Sized> {
    producer: Arc<P>,
    cfg: PollerConfig,
    bus: Bus,
    initial: Option<P::Value>,
}

impl<P> PrecacherBuilder<P>
where
    P: Producer + ?Sized,
{
    /// Creates a builder with default config and a bus nobody listens to.
    pub fn new(producer: Arc<P>) -> Self {
        let cfg = PollerConfig::named(producer.name().to_string());
        Self {
            producer,
            cfg,
            bus: Bus::default(),
            initial: None,
        }
    }

    /// Sets the poller configuration.
    pub fn config(mut self, cfg: PollerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the event bus used for logging.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = bus;
        self
    }

    /// Seeds the cache so [`Precacher::results`] never reports `CacheEmpty`.
    pub fn initial(mut self, value: P::Value) -> Self {
        self.initial = Some(value);
        self
    }

    /// Validates the config and starts polling. Must be called inside a tokio runtime.
    pub fn spawn(self) -> Result<Precacher<P::Value>, ConfigError> {
        let seeded = self.initial.map(|v| {
            Arc::new(CacheEntry {
                value: Some(Arc::new(v)),
                error: None,
                cycle: 0,
                updated_at: SystemTime::now(),
            })
        });
        let cache = Arc::new(Cache {
            slot: RwLock::new(seeded),
        });
        let actor = CacheActor {
            cache: cache.clone(),
            source: Arc::from(&*self.cfg.name),
            bus: self.bus.clone(),
        };
        let poller = Poller::spawn(self.producer, actor, &self.cfg, self.bus)?;
        Ok(Precacher { poller, cache })
    }
}
