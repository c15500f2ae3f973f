//! Buffered sink configuration

use crate::core::{contract, OverflowPolicy, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of queued records that triggers a flush
pub const DEFAULT_FLUSH_THRESHOLD: usize = 50;

/// Default queue capacity before the overflow policy applies
pub const DEFAULT_MAX_QUEUED: usize = 10_000;

/// Batching and backpressure settings of a [`BufferedSink`](super::BufferedSink)
///
/// Missing fields take their defaults when deserialized, so hosts can embed a partial
/// `[buffer]` table in their own configuration files.
///
/// # Example
///
/// ```
/// use rust_event_dispatch::dispatch::BufferConfig;
/// use rust_event_dispatch::OverflowPolicy;
/// use std::time::Duration;
///
/// let config = BufferConfig::new()
///     .with_flush_threshold(100)
///     .with_max_age(Duration::from_millis(250))
///     .with_overflow_policy(OverflowPolicy::DropOldest);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Queue length at which a batch is handed to the deliver step
    pub flush_threshold: usize,

    /// Maximum records held before the overflow policy applies
    pub max_queued: usize,

    /// Flush when the oldest queued record is older than this, checked on each new record
    pub max_age: Option<Duration>,

    pub overflow_policy: OverflowPolicy,
}

impl BufferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold;
        self
    }

    #[must_use]
    pub fn with_max_queued(mut self, max_queued: usize) -> Self {
        self.max_queued = max_queued;
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let block_timeout_positive = match self.overflow_policy {
            OverflowPolicy::BlockWithTimeout(timeout) => !timeout.is_zero(),
            _ => true,
        };

        contract::require(
            "BufferConfig",
            &[
                ("flush_threshold must be at least 1", self.flush_threshold >= 1),
                (
                    "max_queued must be at least flush_threshold",
                    self.max_queued >= self.flush_threshold,
                ),
                (
                    "max_age must be positive",
                    self.max_age.map_or(true, |age| !age.is_zero()),
                ),
                ("block timeout must be positive", block_timeout_positive),
            ],
        )
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            max_queued: DEFAULT_MAX_QUEUED,
            max_age: None,
            overflow_policy: OverflowPolicy::Block,
        }
    }
}
