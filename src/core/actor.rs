//! # Actor: the single consumer driven by a poller.
//!
//! A [`Poller`](crate::Poller) funnels every [`PollResult`] through one channel into
//! one consumption task, which calls [`Actor::recv`]. `recv` is therefore never
//! invoked concurrently with itself, even though producer invocations overlap.
//!
//! ```text
//! tick ─► invoke #1 ─┐
//! tick ─► invoke #2 ─┼─► [result queue] ─► consumption task ─► actor.recv(result)
//! tick ─► invoke #3 ─┘                       (one at a time)
//! ```
//!
//! Built-in actors:
//! - the precacher's cache actor (keeps the last good value)
//! - the broadcaster's fan-out actor (delivers to every subscriber)

use async_trait::async_trait;

use crate::producers::PollResult;

/// Consumer of poll results, typed over the producer's value.
///
/// The poller owns the actor: `recv` takes `&mut self`, so implementations need
/// no locking for state touched only here. State shared with external callers
/// (a cache read path, subscriber registration) still needs its own guard.
#[async_trait]
pub trait Actor<V>: Send + 'static
where
    V: Send + Sync + 'static,
{
    /// Receives one result. Results arrive in completion order.
    async fn recv(&mut self, result: PollResult<V>);
}
