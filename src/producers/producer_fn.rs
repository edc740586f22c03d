//! # Function-backed producer (`ProducerFn`)
//!
//! [`ProducerFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per
//! invocation. Shared state, if any, is captured explicitly (e.g. an `Arc<Client>`).
//!
//! ## Example
//! ```rust
//! use pollcast::{ProducerError, ProducerFn, ProducerRef};
//!
//! let p: ProducerRef<u32> = ProducerFn::arc("answer", || async {
//!     Ok::<_, ProducerError>(Some(42u32))
//! });
//!
//! assert_eq!(p.name(), "answer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::ProducerError;
use crate::producers::producer::{ProduceFuture, Producer};

/// Function-backed producer implementation.
pub struct ProducerFn<F, V> {
    name: Cow<'static, str>,
    f: F,
    _value: PhantomData<fn() -> V>,
}

impl<F, V> ProducerFn<F, V> {
    /// Creates a new function-backed producer.
    ///
    /// Prefer [`ProducerFn::arc`] when you immediately need a shared handle.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _value: PhantomData,
        }
    }

    /// Creates the producer and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut, V> Producer for ProducerFn<F, V>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<V>, ProducerError>> + Send + 'static,
    V: Send + Sync + 'static,
{
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn produce(&self) -> ProduceFuture<V> {
        Box::pin((self.f)())
    }
}

impl<F, V> std::fmt::Debug for ProducerFn<F, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerFn").field("name", &self.name).finish()
    }
}
