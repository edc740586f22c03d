//! # Broadcaster: fan-out of poll results to a dynamic subscriber set.
//!
//! The broadcaster is the [`Actor`] of a streaming [`Poller`](crate::Poller): every
//! result it receives is delivered to **every** registered subscriber in the same
//! logical step, under one lock that also guards registration.
//!
//! ```text
//! Poller ─► consumption task ─► Broadcaster::recv(result)
//!                                   lock(subs)
//!                                   ├─► sub#1.sink.send(result)   (select! send / cancel / closed)
//!                                   ├─► sub#2.sink.send(result)
//!                                   └─► sub#N.sink.send(result)
//!                                   prune cancelled/disconnected
//! ```
//!
//! ## Rules
//! - A slow sink delays every other subscriber and the poller's consumption path.
//!   Sinks are bounded `mpsc` channels; size them for the reader.
//! - Per subscriber, deliveries arrive in the order the broadcaster processed them.
//! - A subscriber whose token fires or whose receiver is dropped is pruned; it
//!   never blocks delivery once that happens.
//! - `close()` drops every remaining sink exactly once. Afterwards `add_sub` returns
//!   `None`, `del_sub` returns `false` and deliveries are ignored.
//!
//! State machine: `Running ──close()──► Closed` (terminal).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    core::actor::Actor,
    events::{Bus, Event, EventKind},
    producers::PollResult,
};

/// Identifier of a registered subscriber. Never reused within one broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Returns the raw id.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Sub<V> {
    sink: mpsc::Sender<PollResult<V>>,
    cancel: CancellationToken,
}

struct Shared<V> {
    name: Arc<str>,
    bus: Bus,
    /// `None` once closed.
    subs: Mutex<Option<BTreeMap<SubscriberId, Sub<V>>>>,
    closed: CancellationToken,
    next_id: AtomicU64,
}

/// Cloneable handle to a subscriber set. All clones share the same set.
pub struct Broadcaster<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Broadcaster<V> {
    /// Marks the broadcaster closed without waiting for the lock.
    ///
    /// Sinks are released once the last handle and watcher drop.
    pub(crate) fn close_detached(&self) {
        self.shared.closed.cancel();
    }
}

impl<V> Clone for Broadcaster<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<V> Broadcaster<V>
where
    V: Send + Sync + 'static,
{
    /// Creates an empty, running broadcaster.
    pub fn new(name: impl Into<Arc<str>>, bus: Bus) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                bus,
                subs: Mutex::new(Some(BTreeMap::new())),
                closed: CancellationToken::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers `sink`. Returns `None` (dropping the sink) if already closed.
    pub async fn add_sub(&self, sink: mpsc::Sender<PollResult<V>>) -> Option<SubscriberId> {
        self.register(sink, CancellationToken::new()).await
    }

    /// Removes a subscriber and drops its sink. Returns `false` if it was not registered.
    pub async fn del_sub(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut guard = self.shared.subs.lock().await;
            guard.as_mut().and_then(|subs| subs.remove(&id)).is_some()
        };
        if removed {
            self.publish_removed(id, "removed");
        }
        removed
    }

    /// Registers `sink` for as long as `token` is not cancelled.
    ///
    /// A watcher task deregisters the subscriber when `token` fires; the subscriber
    /// lives independently of the caller and ends early only if the broadcaster
    /// closes. Returns `None` (dropping the sink) if already closed.
    pub async fn stream_current(
        &self,
        token: CancellationToken,
        sink: mpsc::Sender<PollResult<V>>,
    ) -> Option<SubscriberId> {
        let id = self.register(sink, token.clone()).await?;

        let hub = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    hub.del_sub(id).await;
                }
                _ = hub.shared.closed.cancelled() => {}
            }
        });
        Some(id)
    }

    /// Closes every remaining sink, clears the set and makes later calls no-ops.
    pub async fn close(&self) {
        // Unblocks a delivery that may be holding the lock.
        self.shared.closed.cancel();

        let taken = self.shared.subs.lock().await.take();
        if let Some(subs) = taken {
            let count = subs.len();
            drop(subs);
            self.shared.bus.publish(
                Event::new(EventKind::BroadcasterClosed)
                    .with_source(self.shared.name.clone())
                    .with_fanout(count),
            );
        }
    }

    /// Returns `true` once [`close`](Self::close) has started.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    /// Returns the number of registered subscribers (`0` when closed).
    pub async fn subscriber_count(&self) -> usize {
        self.shared
            .subs
            .lock()
            .await
            .as_ref()
            .map_or(0, BTreeMap::len)
    }

    /// Delivers `result` to every current subscriber.
    pub async fn deliver(&self, result: PollResult<V>) {
        let shared = &self.shared;
        let mut guard = shared.subs.lock().await;
        let Some(subs) = guard.as_mut() else {
            return;
        };

        let mut delivered = 0usize;
        let mut gone: Vec<(SubscriberId, &'static str)> = Vec::new();
        for (id, sub) in subs.iter() {
            tokio::select! {
                biased;
                _ = shared.closed.cancelled() => return,
                _ = sub.cancel.cancelled() => gone.push((*id, "cancelled")),
                sent = sub.sink.send(result.clone()) => match sent {
                    Ok(()) => delivered += 1,
                    Err(_) => gone.push((*id, "disconnected")),
                },
            }
        }
        for (id, _) in &gone {
            subs.remove(id);
        }
        drop(guard);

        for (id, reason) in gone {
            self.publish_removed(id, reason);
        }
        shared.bus.publish(
            Event::new(EventKind::ResultBroadcast)
                .with_source(shared.name.clone())
                .with_cycle(result.cycle)
                .with_fanout(delivered),
        );
    }

    async fn register(
        &self,
        sink: mpsc::Sender<PollResult<V>>,
        cancel: CancellationToken,
    ) -> Option<SubscriberId> {
        let id = {
            let mut guard = self.shared.subs.lock().await;
            let subs = guard.as_mut().filter(|_| !self.is_closed())?;
            let id = SubscriberId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
            subs.insert(id, Sub { sink, cancel });
            id
        };
        self.shared.bus.publish(
            Event::new(EventKind::SubscriberAdded)
                .with_source(self.shared.name.clone())
                .with_subscriber(id.as_u64()),
        );
        Some(id)
    }

    fn publish_removed(&self, id: SubscriberId, reason: &'static str) {
        self.shared.bus.publish(
            Event::new(EventKind::SubscriberRemoved)
                .with_source(self.shared.name.clone())
                .with_subscriber(id.as_u64())
                .with_reason(reason),
        );
    }
}

#[async_trait]
impl<V> Actor<V> for Broadcaster<V>
where
    V: Send + Sync + 'static,
{
    async fn recv(&mut self, result: PollResult<V>) {
        self.deliver(result).await;
    }
}

impl<V> fmt::Debug for Broadcaster<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("name", &self.shared.name)
            .field("closed", &self.shared.closed.is_cancelled())
            .finish()
    }
}
