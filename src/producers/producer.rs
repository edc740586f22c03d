//! # Producer abstraction.
//!
//! A [`Producer`] fetches one fresh value from a slow external source (an HTTP API,
//! a database, a device). Its latency is unbounded and dominated by I/O.
//!
//! The engine owns nothing inside a producer: it only calls [`Producer::produce`]
//! on every tick, possibly while earlier invocations are still in flight, so
//! implementations must be safe to invoke concurrently.
//!
//! `Ok(None)` means "no new data this cycle": a [`Precacher`](crate::Precacher)
//! keeps its previous value, subscribers see an empty result.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ProducerError;

/// Boxed future returned by [`Producer::produce`].
///
/// `'static` so the poller can spawn every invocation as an independent task.
pub type ProduceFuture<V> =
    Pin<Box<dyn Future<Output = Result<Option<V>, ProducerError>> + Send + 'static>>;

/// Shared handle to a producer.
pub type ProducerRef<V> = Arc<dyn Producer<Value = V>>;

/// # Concurrent-safe value source.
///
/// # Example
/// ```
/// use pollcast::{ProduceFuture, Producer, ProducerError};
///
/// struct Clock;
///
/// impl Producer for Clock {
///     type Value = std::time::SystemTime;
///
///     fn name(&self) -> &str { "clock" }
///
///     fn produce(&self) -> ProduceFuture<Self::Value> {
///         Box::pin(async { Ok::<_, ProducerError>(Some(std::time::SystemTime::now())) })
///     }
/// }
/// ```
pub trait Producer: Send + Sync + 'static {
    /// Domain value fetched by this producer.
    type Value: Send + Sync + 'static;

    /// Returns a stable, human-readable producer name.
    fn name(&self) -> &str;

    /// Starts one fetch.
    ///
    /// Each call must return a **new** future that owns everything it needs.
    fn produce(&self) -> ProduceFuture<Self::Value>;
}
