//! # Producer abstractions and poll results.
//!
//! This module provides the value-source side of the engine:
//! - [`Producer`] - trait for a capability that fetches one fresh domain value
//! - [`ProducerFn`] - closure-backed producer
//! - [`ProducerRef`] - shared reference to a producer (`Arc<dyn Producer<Value = V>>`)
//! - [`PollResult`] - one invocation's outcome as handed to actors and subscribers

mod producer;
mod producer_fn;
mod result;

pub use producer::{ProduceFuture, Producer, ProducerRef};
pub use producer_fn::ProducerFn;
pub use result::PollResult;
