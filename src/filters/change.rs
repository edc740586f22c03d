//! # ChangeFilter: per-subscription dedup state.
//!
//! ```text
//! broadcaster ─► [src rx] ─► ChangeFilter::admit ─► [dst tx] ─► consumer
//!                                 │
//!                          last forwarded value
//! ```
//!
//! Memory starts absent, the same state an empty result or an error leaves
//! behind. A first empty result is therefore a repeat of "nothing" and is
//! suppressed, while a first value is always a change.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Equivalence;
use crate::producers::PollResult;

/// Forwards only results that differ from the last forwarded one.
pub struct ChangeFilter<V, Q> {
    eq: Q,
    /// Last forwarded value; `None` while absent and after each error.
    last: Option<Arc<V>>,
    _value: PhantomData<fn(&V)>,
}

impl<V, Q> ChangeFilter<V, Q>
where
    V: Send + Sync + 'static,
    Q: Equivalence<V>,
{
    /// Creates a filter whose memory holds an absent value.
    pub fn new(eq: Q) -> Self {
        Self {
            eq,
            last: None,
            _value: PhantomData,
        }
    }

    /// Returns `true` if `result` should reach the consumer, updating memory.
    pub fn admit(&mut self, result: &PollResult<V>) -> bool {
        if result.is_error() {
            self.last = None;
            return true;
        }
        let forward = !self.eq.equivalent(self.last.as_deref(), result.get());
        if forward {
            self.last = result.value.clone();
        }
        forward
    }

    /// Runs the filter as a task between `src` and `dst`.
    ///
    /// The task ends, dropping `dst`, when `src` closes or `dst`'s receiver goes away.
    /// Dropping `src` in turn makes the upstream broadcaster prune the subscription.
    pub fn spawn(
        mut self,
        mut src: mpsc::Receiver<PollResult<V>>,
        dst: mpsc::Sender<PollResult<V>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let result = tokio::select! {
                    biased;
                    _ = dst.closed() => break,
                    msg = src.recv() => match msg {
                        Some(result) => result,
                        None => break,
                    },
                };
                if self.admit(&result) && dst.send(result).await.is_err() {
                    break;
                }
            }
        })
    }
}

impl<V, Q> fmt::Debug for ChangeFilter<V, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFilter")
            .field("holds_value", &self.last.is_some())
            .finish()
    }
}
