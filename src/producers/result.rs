//! # Poll result.
//!
//! [`PollResult`] is what one producer invocation hands downstream: an optional
//! value, an optional error, and the invocation's `cycle` number.
//!
//! `cycle` is assigned when the invocation **starts**. Invocations may overlap and
//! complete out of order, so a consumer can observe cycle 5 before cycle 4; the
//! delivered stream is "most recently completed", not "most recently started".

use std::sync::Arc;

use crate::error::ProducerError;

/// Outcome of one producer invocation.
///
/// Cheap to clone: the value is shared behind an `Arc`.
#[derive(Debug)]
pub struct PollResult<V> {
    /// Fetched value; `None` when the producer had nothing new or failed.
    pub value: Option<Arc<V>>,
    /// Producer error, if the invocation failed.
    pub error: Option<ProducerError>,
    /// 1-based invocation number (start order).
    pub cycle: u64,
}

impl<V> PollResult<V> {
    /// Converts a producer's return value into a result for `cycle`.
    pub fn from_produced(cycle: u64, produced: Result<Option<V>, ProducerError>) -> Self {
        match produced {
            Ok(value) => Self {
                value: value.map(Arc::new),
                error: None,
                cycle,
            },
            Err(error) => Self {
                value: None,
                error: Some(error),
                cycle,
            },
        }
    }

    /// A successful result carrying `value`.
    pub fn value(cycle: u64, value: V) -> Self {
        Self {
            value: Some(Arc::new(value)),
            error: None,
            cycle,
        }
    }

    /// A successful result with no value.
    pub fn empty(cycle: u64) -> Self {
        Self {
            value: None,
            error: None,
            cycle,
        }
    }

    /// A failed result.
    pub fn failed(cycle: u64, error: ProducerError) -> Self {
        Self {
            value: None,
            error: Some(error),
            cycle,
        }
    }

    /// Returns `true` if the invocation failed.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Borrows the value, if any.
    #[inline]
    pub fn get(&self) -> Option<&V> {
        self.value.as_deref()
    }
}

impl<V> Clone for PollResult<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            error: self.error.clone(),
            cycle: self.cycle,
        }
    }
}
