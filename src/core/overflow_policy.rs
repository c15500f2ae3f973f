//! Overflow policies for buffered dispatch queues
//!
//! When a buffered sink's queue reaches its configured maximum, these policies decide what
//! happens to the next record. The default blocks the producer: losing records is only ever
//! the result of an explicit configuration choice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Policy for handling a full buffered queue
///
/// # Example
///
/// ```
/// use rust_event_dispatch::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: block until a flush frees space
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::Block);
///
/// // Block with timeout, then drop the new record
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Block until space is available
    ///
    /// The producer waits for the in-flight flush to complete. No record is lost.
    #[default]
    Block,

    /// Block with timeout, then drop the incoming record
    ///
    /// Attempts to wait for space, but drops if timeout expires.
    BlockWithTimeout(Duration),

    /// Evict the oldest queued record to make room
    DropOldest,

    /// Discard the incoming record
    DropNewest,
}

impl OverflowPolicy {
    /// Whether this policy can discard records
    pub fn may_drop(&self) -> bool {
        !matches!(self, OverflowPolicy::Block)
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::DropOldest => write!(f, "DropOldest"),
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
        }
    }
}
