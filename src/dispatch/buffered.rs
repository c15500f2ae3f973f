//! Batching sink with synchronous or executor-backed delivery
//!
//! A [`BufferedSink`] formats each event on the producer's thread and queues the record.
//! A batch leaves the queue when one of these triggers fires:
//!
//! - the queue reaches `flush_threshold`
//! - the oldest queued record is older than `max_age` (checked when a record arrives and
//!   when an in-flight batch completes)
//! - [`Sink::flush`] is called, or the sink is dropped, or [`shutdown`](super::shutdown) runs
//!
//! At most one batch per sink is in flight. Records arriving meanwhile keep accumulating, and
//! when the in-flight batch completes with a trigger already due the next batch starts
//! immediately. Without an executor the batch is delivered on the thread that
//! triggered it; with one, the triggering call returns as soon as the job is submitted.

use super::config::BufferConfig;
use super::deliver::Deliver;
use super::executor::{Executor, TaskHandle};
use super::format::Format;
use super::registry::{self, Drain};
use crate::core::diagnostics::{self, Diagnostic, DiagnosticHandler};
use crate::core::error::panic_message;
use crate::core::{
    BufferMetrics, Event, LoggerError, OverflowPolicy, Result, Sink, DEFAULT_SHUTDOWN_TIMEOUT,
};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Drop alerts fire on the first drop and then once per this many drops
const DROP_ALERT_INTERVAL: u64 = 1000;

struct BufferState<R> {
    queue: VecDeque<R>,
    /// When the queue last went from empty to non-empty
    pending_since: Option<Instant>,
    in_flight: bool,
    last_task: Option<TaskHandle>,
    /// Diagnostics raised under the lock, reported once it is released
    reports: Vec<Diagnostic>,
}

struct Shared<R> {
    name: String,
    config: BufferConfig,
    deliver: Box<dyn Deliver<R>>,
    executor: Option<Arc<dyn Executor>>,
    state: Mutex<BufferState<R>>,
    /// Signalled whenever a batch completes
    settled: Condvar,
    metrics: BufferMetrics,
    diagnostics: DiagnosticHandler,
}

/// How a batch left the queue, which decides how its failure is reported
#[derive(Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// Threshold, age or backpressure on the producer path: failures go to diagnostics
    Automatic,
    /// Explicit flush or drain: failures are returned to the caller
    Explicit,
}

impl<R: Send + 'static> Shared<R> {
    fn enqueue(self: &Arc<Self>, record: R) -> Result<()> {
        let mut state = self.state.lock();

        if state.queue.len() >= self.config.max_queued {
            self.metrics.record_queue_full();
            match self.config.overflow_policy {
                OverflowPolicy::Block => {
                    self.metrics.record_block();
                    self.make_room(&mut state, None);
                }
                OverflowPolicy::BlockWithTimeout(timeout) => {
                    self.metrics.record_block();
                    if !self.make_room(&mut state, Some(Instant::now() + timeout)) {
                        self.record_policy_drop(&mut state);
                        self.release(state);
                        return Ok(());
                    }
                }
                OverflowPolicy::DropOldest => {
                    state.queue.pop_front();
                    self.record_policy_drop(&mut state);
                }
                OverflowPolicy::DropNewest => {
                    self.record_policy_drop(&mut state);
                    self.release(state);
                    return Ok(());
                }
            }
        }

        if state.queue.is_empty() {
            state.pending_since = Some(Instant::now());
        }
        state.queue.push_back(record);
        self.metrics.record_enqueued();

        self.dispatch_due(&mut state);
        self.release(state);
        Ok(())
    }

    fn flush_due(&self, state: &BufferState<R>) -> bool {
        if state.queue.len() >= self.config.flush_threshold {
            return true;
        }
        match (self.config.max_age, state.pending_since) {
            (Some(max_age), Some(since)) => !state.queue.is_empty() && since.elapsed() >= max_age,
            _ => false,
        }
    }

    /// Start batches while an automatic trigger holds and nothing is in flight
    fn dispatch_due(self: &Arc<Self>, state: &mut MutexGuard<'_, BufferState<R>>) {
        while !state.in_flight && self.flush_due(state) {
            self.dispatch(state);
        }
    }

    /// Unlock the state, then hand queued diagnostics to the handler
    ///
    /// The handler may call back into this sink, so it never runs under the lock.
    fn release(&self, mut state: MutexGuard<'_, BufferState<R>>) {
        let reports = std::mem::take(&mut state.reports);
        drop(state);
        for diagnostic in reports {
            diagnostics::report(&self.diagnostics, diagnostic);
        }
    }

    /// Wait until the queue has room, dispatching it ourselves when nothing is in flight
    ///
    /// Returns false if the deadline passed first.
    fn make_room(
        self: &Arc<Self>,
        state: &mut MutexGuard<'_, BufferState<R>>,
        deadline: Option<Instant>,
    ) -> bool {
        while state.queue.len() >= self.config.max_queued {
            if !state.in_flight {
                self.dispatch(state);
                continue;
            }
            match deadline {
                Some(deadline) => {
                    if self.settled.wait_until(state, deadline).timed_out() {
                        return state.queue.len() < self.config.max_queued;
                    }
                }
                None => self.settled.wait(state),
            }
        }
        true
    }

    /// Move the whole queue into a batch and hand it to the executor or deliver it inline
    fn dispatch(self: &Arc<Self>, state: &mut MutexGuard<'_, BufferState<R>>) {
        let batch = Self::take_batch(state);
        if batch.is_empty() {
            return;
        }
        state.in_flight = true;

        let Some(executor) = self.executor.as_ref() else {
            // Failures on this path are reported through diagnostics
            let _ = self.deliver_inline(state, batch, Trigger::Automatic);
            return;
        };

        // The batch stays reachable here in case the executor refuses the job
        let slot = Arc::new(Mutex::new(Some(batch)));
        let job_slot = Arc::clone(&slot);
        let shared = Arc::clone(self);
        let job = Box::new(move || {
            if let Some(batch) = job_slot.lock().take() {
                shared.deliver_async(batch);
            }
        });

        match executor.submit(job) {
            Ok(handle) => state.last_task = Some(handle),
            Err(e) => {
                state.reports.push(Diagnostic::ExecutorFallback {
                    sink: self.name.clone(),
                    message: e.to_string(),
                });
                if let Some(batch) = slot.lock().take() {
                    let _ = self.deliver_inline(state, batch, Trigger::Automatic);
                }
            }
        }
    }

    fn take_batch(state: &mut BufferState<R>) -> Vec<R> {
        state.pending_since = None;
        state.queue.drain(..).collect()
    }

    /// Deliver on the current thread with the state unlocked, then settle the batch
    fn deliver_inline(
        &self,
        state: &mut MutexGuard<'_, BufferState<R>>,
        batch: Vec<R>,
        trigger: Trigger,
    ) -> Result<()> {
        let records = batch.len();
        let outcome = MutexGuard::unlocked(state, || self.call_deliver(batch));

        state.in_flight = false;
        self.settled.notify_all();

        match outcome {
            Ok(()) => {
                self.metrics.record_delivered(records as u64);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_delivery_failure();
                self.metrics.record_dropped(records as u64);
                if trigger == Trigger::Automatic {
                    state.reports.push(Diagnostic::BatchDiscarded {
                        sink: self.name.clone(),
                        records,
                        message: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    /// Body of an executor job
    fn deliver_async(self: &Arc<Self>, batch: Vec<R>) {
        let records = batch.len();
        match self.call_deliver(batch) {
            Ok(()) => self.metrics.record_delivered(records as u64),
            Err(e) => {
                self.metrics.record_delivery_failure();
                self.metrics.record_dropped(records as u64);
                diagnostics::report(
                    &self.diagnostics,
                    Diagnostic::AsyncDeliveryFailed {
                        sink: self.name.clone(),
                        records,
                        message: e.to_string(),
                    },
                );
            }
        }

        let mut state = self.state.lock();
        state.in_flight = false;
        self.settled.notify_all();
        self.dispatch_due(&mut state);
        self.release(state);
    }

    fn call_deliver(&self, batch: Vec<R>) -> Result<()> {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.deliver.deliver(batch)))
            .unwrap_or_else(|payload| {
                Err(LoggerError::delivery(format!(
                    "deliver panicked: {}",
                    panic_message(payload.as_ref())
                )))
            })
    }

    /// Count a record shed by the overflow policy and queue the rate-limited alert
    fn record_policy_drop(&self, state: &mut BufferState<R>) {
        let previous = self.metrics.record_policy_drop();
        let total = previous + 1;
        if previous == 0 || total % DROP_ALERT_INTERVAL == 0 {
            state.reports.push(Diagnostic::RecordsDropped {
                sink: self.name.clone(),
                policy: self.config.overflow_policy,
                total_dropped: total,
            });
        }
    }

    /// Wait for the in-flight batch, then deliver everything queued on the calling thread
    fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        while state.in_flight {
            self.settled.wait(&mut state);
        }

        let mut first_error = None;
        while !state.queue.is_empty() {
            let batch = Self::take_batch(&mut state);
            state.in_flight = true;
            if let Err(e) = self.deliver_inline(&mut state, batch, Trigger::Explicit) {
                first_error.get_or_insert(e);
            }
        }
        let last_task = state.last_task.take();
        self.release(state);

        // The job's own bookkeeping runs after it clears the in-flight flag
        if let Some(task) = last_task {
            task.wait_timeout(DEFAULT_SHUTDOWN_TIMEOUT);
        }

        let backend = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.deliver.flush()
        }))
        .unwrap_or_else(|payload| {
            Err(LoggerError::delivery(format!(
                "deliver flush panicked: {}",
                panic_message(payload.as_ref())
            )))
        });

        match first_error {
            Some(e) => Err(e),
            None => backend,
        }
    }
}

impl<R: Send + 'static> Drain for Shared<R> {
    fn sink_name(&self) -> &str {
        &self.name
    }

    fn drain(&self) -> Result<()> {
        self.flush()
    }

    fn report_drain_failure(&self, error: &LoggerError) {
        diagnostics::report(
            &self.diagnostics,
            Diagnostic::DrainFailed {
                sink: self.name.clone(),
                message: error.to_string(),
            },
        );
    }
}

/// Sink that batches formatted records before handing them to a [`Deliver`] implementation
///
/// Dropping the sink flushes whatever is still queued.
///
/// # Example
///
/// ```
/// use rust_event_dispatch::dispatch::{BufferedSink, TextFormat};
/// use rust_event_dispatch::core::Sink;
/// use rust_event_dispatch::EventLevel;
///
/// let sink = BufferedSink::builder("batched", TextFormat::new(), |lines: Vec<String>| -> rust_event_dispatch::Result<()> {
///     println!("{} lines", lines.len());
///     Ok(())
/// })
/// .flush_threshold(10)
/// .build()
/// .unwrap();
///
/// sink.emit(&EventLevel::NOTE.event("queued")).unwrap();
/// assert_eq!(sink.queued(), 1);
/// sink.flush().unwrap();
/// assert_eq!(sink.queued(), 0);
/// ```
pub struct BufferedSink<F: Format> {
    format: F,
    shared: Arc<Shared<F::Record>>,
}

impl<F: Format> BufferedSink<F> {
    pub fn builder<D>(name: impl Into<String>, format: F, deliver: D) -> BufferedSinkBuilder<F>
    where
        D: Deliver<F::Record> + 'static,
    {
        BufferedSinkBuilder {
            name: name.into(),
            format,
            deliver: Box::new(deliver),
            config: BufferConfig::default(),
            executor: None,
            diagnostics: diagnostics::stderr_handler(),
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.shared.config
    }

    pub fn metrics(&self) -> &BufferMetrics {
        &self.shared.metrics
    }

    /// Records waiting for the next batch
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.state.lock().in_flight
    }

    pub fn is_async(&self) -> bool {
        self.shared.executor.is_some()
    }
}

impl<F: Format> Sink for BufferedSink<F> {
    fn emit(&self, event: &Event) -> Result<()> {
        let record = self.format.format(event)?;
        self.shared.enqueue(record)
    }

    fn flush(&self) -> Result<()> {
        self.shared.flush()
    }

    fn name(&self) -> &str {
        &self.shared.name
    }
}

impl<F: Format> Drop for BufferedSink<F> {
    fn drop(&mut self) {
        if let Err(e) = self.shared.flush() {
            self.shared.report_drain_failure(&e);
        }
    }
}

impl<F: Format> std::fmt::Debug for BufferedSink<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedSink")
            .field("name", &self.shared.name)
            .field("config", &self.shared.config)
            .field("queued", &self.queued())
            .field("async", &self.is_async())
            .finish()
    }
}

/// Builder for [`BufferedSink`]
pub struct BufferedSinkBuilder<F: Format> {
    name: String,
    format: F,
    deliver: Box<dyn Deliver<F::Record>>,
    config: BufferConfig,
    executor: Option<Arc<dyn Executor>>,
    diagnostics: DiagnosticHandler,
}

impl<F: Format> BufferedSinkBuilder<F> {
    /// Replace the whole configuration, e.g. one loaded from a host config file
    #[must_use]
    pub fn config(mut self, config: BufferConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.config.flush_threshold = flush_threshold;
        self
    }

    #[must_use]
    pub fn max_queued(mut self, max_queued: usize) -> Self {
        self.config.max_queued = max_queued;
        self
    }

    #[must_use]
    pub fn max_age(mut self, max_age: std::time::Duration) -> Self {
        self.config.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Deliver batches through an executor instead of on the producer's thread
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    #[must_use]
    pub fn diagnostics(mut self, handler: DiagnosticHandler) -> Self {
        self.diagnostics = handler;
        self
    }

    /// Validate the configuration and register the sink for [`shutdown`](super::shutdown)
    pub fn build(self) -> Result<BufferedSink<F>> {
        self.config.validate()?;
        crate::core::contract::require(
            "BufferedSink",
            &[("sink name must not be empty", !self.name.trim().is_empty())],
        )?;

        let shared = Arc::new(Shared {
            name: self.name,
            state: Mutex::new(BufferState {
                queue: VecDeque::with_capacity(self.config.flush_threshold),
                pending_since: None,
                in_flight: false,
                last_task: None,
                reports: Vec::new(),
            }),
            config: self.config,
            deliver: self.deliver,
            executor: self.executor,
            settled: Condvar::new(),
            metrics: BufferMetrics::new(),
            diagnostics: self.diagnostics,
        });
        registry::register(Arc::downgrade(&shared) as std::sync::Weak<dyn Drain>);

        Ok(BufferedSink {
            format: self.format,
            shared,
        })
    }
}
