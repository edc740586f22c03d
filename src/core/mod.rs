//! Engine core: polling, caching and broadcasting.
//!
//! - [`poller`]: drives a producer on an interval and feeds one actor;
//! - [`runner`]: executes one invocation with timeout, panic capture and events;
//! - [`actor`]: the single-consumer trait a poller drives;
//! - [`precacher`]: last-known-good cache built on a poller;
//! - [`broadcaster`]: subscriber set fed by a poller;
//! - [`streamer`]: poller + broadcaster with cancellable, filterable streams.

mod actor;
mod broadcaster;
mod poller;
mod precacher;
mod runner;
mod streamer;

pub use actor::Actor;
pub use broadcaster::{Broadcaster, SubscriberId};
pub use poller::Poller;
pub use precacher::{CacheEntry, Precacher, PrecacherBuilder};
pub use runner::run_once;
pub use streamer::{Streamer, StreamerBuilder};
