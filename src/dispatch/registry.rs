//! Process-wide registry of live buffered sinks
//!
//! Every [`BufferedSink`](super::BufferedSink) registers a weak reference to its buffer when
//! built. [`shutdown`] drains every buffer that is still alive, so a host can flush all
//! pending records before exiting without tracking its sinks itself.

use crate::core::{LoggerError, Result};
use parking_lot::Mutex;
use std::sync::Weak;

/// Buffer that can be drained on demand
pub(crate) trait Drain: Send + Sync {
    fn sink_name(&self) -> &str;

    fn drain(&self) -> Result<()>;

    fn report_drain_failure(&self, error: &LoggerError);
}

static REGISTRY: Mutex<Vec<Weak<dyn Drain>>> = parking_lot::const_mutex(Vec::new());

pub(crate) fn register(sink: Weak<dyn Drain>) {
    let mut registry = REGISTRY.lock();
    registry.retain(|entry| entry.strong_count() > 0);
    registry.push(sink);
}

/// Upgrade every live entry, pruning dead ones, without holding the lock while draining
fn live() -> Vec<std::sync::Arc<dyn Drain>> {
    let mut registry = REGISTRY.lock();
    registry.retain(|entry| entry.strong_count() > 0);
    registry.iter().filter_map(Weak::upgrade).collect()
}

/// Outcome of [`shutdown`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Sinks whose buffers were drained successfully
    pub drained: usize,

    /// Sinks whose drain failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drain every live buffered sink synchronously
///
/// Each drain waits for the sink's in-flight batch before delivering what is queued. Failures
/// are reported through the owning sink's diagnostics handler and collected in the report;
/// they never stop the remaining sinks from draining. Sinks stay usable afterwards.
///
/// # Example
///
/// ```
/// let report = rust_event_dispatch::shutdown();
/// assert!(report.is_clean());
/// ```
pub fn shutdown() -> ShutdownReport {
    let mut report = ShutdownReport::default();
    for sink in live() {
        match sink.drain() {
            Ok(()) => report.drained += 1,
            Err(e) => {
                sink.report_drain_failure(&e);
                report
                    .failed
                    .push((sink.sink_name().to_string(), e.to_string()));
            }
        }
    }
    report
}

/// Flush every live buffered sink, returning the first failure
pub fn flush_all() -> Result<()> {
    let mut first_error = None;
    for sink in live() {
        if let Err(e) = sink.drain() {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Number of buffered sinks currently alive
pub fn live_sinks() -> usize {
    let mut registry = REGISTRY.lock();
    registry.retain(|entry| entry.strong_count() > 0);
    registry.len()
}
