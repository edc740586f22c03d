//! Error types used by the polling engine and by producers.
//!
//! This module defines three enums:
//!
//! - [`ProducerError`] - failures of a single producer invocation, delivered verbatim downstream.
//! - [`PollError`] - errors returned by cache readers ([`Precacher`](crate::Precacher)).
//! - [`ConfigError`] - rejected construction-time configuration.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a producer invocation.
///
/// The engine never retries or swallows these: every one is handed to the
/// downstream actor (cache field or every subscriber). Retry policy, if any,
/// belongs to the producer implementation.
///
/// `Clone` so a single result can be fanned out to many subscribers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProducerError {
    /// The upstream fetch failed.
    #[error("produce failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The invocation exceeded the configured per-invocation timeout.
    #[error("produce timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The producer future panicked; the panic was caught by the poller.
    #[error("producer panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ProducerError {
    /// Shorthand for [`ProducerError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use pollcast::ProducerError;
    ///
    /// let err = ProducerError::fail("503 from upstream");
    /// assert_eq!(err.to_string(), "produce failed: 503 from upstream");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        ProducerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProducerError::Fail { .. } => "produce_failed",
            ProducerError::Timeout { .. } => "produce_timeout",
            ProducerError::Panicked { .. } => "produce_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ProducerError::Fail { error } => format!("error: {error}"),
            ProducerError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            ProducerError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

/// Text of a payload caught by `catch_unwind`; non-string payloads become "unknown panic".
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    match payload.downcast_ref::<&'static str>() {
        Some(msg) => (*msg).to_string(),
        None => payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_else(|| "unknown panic".to_string()),
    }
}

/// # Errors returned when reading a precached value.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// Nothing has been delivered to the cache yet.
    ///
    /// Distinct from [`PollError::Producer`] so callers can tell
    /// "never fetched" from "fetch failed".
    #[error("poll: empty cache")]
    CacheEmpty,

    /// The most recent delivery carried a producer error.
    #[error(transparent)]
    Producer(#[from] ProducerError),
}

impl PollError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollcast::PollError;
    ///
    /// assert_eq!(PollError::CacheEmpty.as_label(), "cache_empty");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PollError::CacheEmpty => "cache_empty",
            PollError::Producer(e) => e.as_label(),
        }
    }

    /// Returns `true` for [`PollError::CacheEmpty`].
    pub fn is_cache_empty(&self) -> bool {
        matches!(self, PollError::CacheEmpty)
    }
}

/// # Errors raised while validating configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A poll interval of zero would spin the ticker.
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroInterval => "config_zero_interval",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_error_labels() {
        assert_eq!(ProducerError::fail("x").as_label(), "produce_failed");
        assert_eq!(
            ProducerError::Timeout {
                timeout: Duration::from_secs(1)
            }
            .as_label(),
            "produce_timeout"
        );
        assert_eq!(
            ProducerError::Panicked { info: "boom".into() }.as_message(),
            "panic: boom"
        );
    }

    #[test]
    fn test_poll_error_wraps_producer_error() {
        let err: PollError = ProducerError::fail("down").into();
        assert!(!err.is_cache_empty());
        assert_eq!(err.as_label(), "produce_failed");
        assert_eq!(err.to_string(), "produce failed: down");
        assert!(PollError::CacheEmpty.is_cache_empty());
    }
}
