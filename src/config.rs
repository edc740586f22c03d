//! # Construction-time configuration.
//!
//! Provides [`PollerConfig`] and [`StreamerConfig`], plain settings values consumed
//! by the builders of [`Precacher`](crate::Precacher) and [`Streamer`](crate::Streamer).
//!
//! Configuration only affects timing and observability, never correctness.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no per-invocation timeout
//! - `result_capacity = 0` → clamped to 1
//! - `sink_capacity = 0` → clamped to 1
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use pollcast::PollerConfig;
//!
//! let mut cfg = PollerConfig::named("location-history");
//! cfg.interval = Duration::from_secs(120);
//! cfg.timeout = Duration::from_secs(10);
//!
//! assert!(cfg.validate().is_ok());
//! assert_eq!(cfg.invocation_timeout(), Some(Duration::from_secs(10)));
//! ```

use std::borrow::Cow;
use std::time::Duration;

use crate::error::ConfigError;

/// Settings for a [`Poller`](crate::Poller).
///
/// ## Field semantics
/// - `name`: source label attached to every published event
/// - `interval`: wall-clock period between producer invocations (must be `> 0`)
/// - `timeout`: per-invocation timeout (`0s` = none)
/// - `result_capacity`: queue between in-flight invocations and the consumption task (min 1)
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Source label used in events.
    pub name: Cow<'static, str>,

    /// Period between producer invocations.
    ///
    /// The first invocation happens immediately; each following tick starts a
    /// new concurrent invocation regardless of whether earlier ones finished.
    pub interval: Duration,

    /// Per-invocation timeout.
    ///
    /// - `Duration::ZERO` = the invocation may take as long as it likes
    /// - `> 0` = an invocation still running after `timeout` is delivered as
    ///   [`ProducerError::Timeout`](crate::ProducerError::Timeout)
    pub timeout: Duration,

    /// Capacity of the result queue feeding the consumption task.
    pub result_capacity: usize,
}

impl PollerConfig {
    /// Default configuration with a custom source label.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the per-invocation timeout as an `Option`.
    #[inline]
    pub fn invocation_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the result queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn result_capacity_clamped(&self) -> usize {
        self.result_capacity.max(1)
    }

    /// Rejects settings the poller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == Duration::ZERO {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    /// Default configuration:
    ///
    /// - `name = "poller"`
    /// - `interval = 60s`
    /// - `timeout = 0s` (none)
    /// - `result_capacity = 64`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("poller"),
            interval: Duration::from_secs(60),
            timeout: Duration::ZERO,
            result_capacity: 64,
        }
    }
}

/// Settings for a [`Streamer`](crate::Streamer).
#[derive(Clone, Debug)]
pub struct StreamerConfig {
    /// Settings of the underlying poller.
    pub poller: PollerConfig,

    /// Buffer size of channels created by [`Streamer::subscribe`](crate::Streamer::subscribe).
    ///
    /// A full buffer blocks delivery to every subscriber until it drains.
    pub sink_capacity: usize,
}

impl StreamerConfig {
    /// Returns the sink capacity clamped to a minimum of 1.
    #[inline]
    pub fn sink_capacity_clamped(&self) -> usize {
        self.sink_capacity.max(1)
    }

    /// Rejects settings the streamer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.poller.validate()
    }
}

impl Default for StreamerConfig {
    /// Default configuration:
    ///
    /// - `poller.name = "streamer"`, `poller.interval = 1s`
    /// - `sink_capacity = 1`
    fn default() -> Self {
        Self {
            poller: PollerConfig {
                name: Cow::Borrowed("streamer"),
                interval: Duration::from_secs(1),
                ..PollerConfig::default()
            },
            sink_capacity: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_rejected() {
        let mut cfg = PollerConfig::default();
        cfg.interval = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroInterval));

        let mut scfg = StreamerConfig::default();
        scfg.poller.interval = Duration::ZERO;
        assert_eq!(scfg.validate(), Err(ConfigError::ZeroInterval));
    }

    #[test]
    fn test_sentinels() {
        let mut cfg = PollerConfig::default();
        assert_eq!(cfg.invocation_timeout(), None);
        cfg.result_capacity = 0;
        assert_eq!(cfg.result_capacity_clamped(), 1);

        let mut scfg = StreamerConfig::default();
        scfg.sink_capacity = 0;
        assert_eq!(scfg.sink_capacity_clamped(), 1);
        assert_eq!(scfg.poller.name, "streamer");
    }
}
