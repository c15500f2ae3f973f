//! Main logger implementation

use super::{
    contract,
    diagnostics::{self, Diagnostic, DiagnosticHandler},
    error::{LoggerError, Result},
    event::{Event, Middleware},
    limits::Limits,
    metrics::DispatchMetrics,
    receiver::Receiver,
    tags::TagSet,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default shutdown timeout for worker cleanup (5 seconds)
///
/// Used when an executor is dropped without an explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Composable dispatch pipeline
///
/// A `Logger` is an immutable value. Every `with_*` method returns a new logger sharing the
/// unchanged parts with the original, so a configured logger can be specialised per module
/// without affecting other holders.
///
/// Calling [`log`](Self::log) runs the middleware chain, checks the logger's limits, merges
/// the logger's tags and hands the event to each receiver in registration order on the
/// caller's thread. A failing receiver is reported through the diagnostics handler and the
/// remaining receivers still run.
///
/// # Example
///
/// ```
/// use rust_event_dispatch::prelude::*;
///
/// let logger = logger()
///     .with_limits(30, 100)
///     .unwrap()
///     .with_tags(["api"])
///     .unwrap()
///     .with_receivers([Receiver::from_fn("stdout", |event: &Event| {
///         println!("{} {}", event.level(), event.message());
///         Ok(())
///     })], true);
///
/// let event = logger.log(EventLevel::WARNING.event("slow response"));
/// assert!(event.tags().contains("api"));
/// ```
#[derive(Clone)]
pub struct Logger {
    middleware: Arc<[Middleware]>,
    limits: Limits,
    tags: Arc<TagSet>,
    receivers: Arc<[Receiver]>,
    labels: Arc<[String]>,
    diagnostics: DiagnosticHandler,
    metrics: Arc<DispatchMetrics>,
}

/// Logger with no receivers, limits `[0, 100]`, no tags and no middleware
pub fn logger() -> Logger {
    Logger::new()
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            middleware: Arc::from(Vec::new()),
            limits: Limits::ALL,
            tags: Arc::new(TagSet::new()),
            receivers: Arc::from(Vec::new()),
            labels: Arc::from(Vec::new()),
            diagnostics: diagnostics::stderr_handler(),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Dispatch an event and return it after middleware and tag merging
    ///
    /// Events outside the logger's limits skip every receiver and are returned as the
    /// middleware left them. Otherwise the returned event is the tag-merged value the
    /// receivers saw, whether or not any of them fired, so calls can be chained.
    ///
    /// A panic raised by logger middleware propagates to the caller; failures inside
    /// receivers never do.
    pub fn log(&self, event: Event) -> Event {
        let event = self
            .middleware
            .iter()
            .fold(event, |current, transform| transform(current));

        if !self.limits.admits(event.severity()) {
            self.metrics.record_filtered();
            return event;
        }

        let event = if self.tags.is_empty() {
            event
        } else {
            event.with_tags(&self.tags)
        };

        self.metrics.record_dispatched();
        for (index, (receiver, label)) in self.receivers.iter().zip(self.labels.iter()).enumerate()
        {
            if let Err(error) = receiver.receive(&event) {
                self.metrics.record_receiver_failure();
                diagnostics::report(
                    &self.diagnostics,
                    Diagnostic::ReceiverFailed {
                        index,
                        label: label.clone(),
                        error,
                    },
                );
            }
        }

        event
    }

    /// Add receivers after the existing ones, or replace them when `append` is false
    #[must_use]
    pub fn with_receivers<I>(&self, receivers: I, append: bool) -> Self
    where
        I: IntoIterator<Item = Receiver>,
    {
        let mut combined: Vec<Receiver> = if append {
            self.receivers.to_vec()
        } else {
            Vec::new()
        };
        combined.extend(receivers);

        let labels: Vec<String> = combined
            .iter()
            .enumerate()
            .map(|(index, receiver)| format!("#{} {}", index, receiver.name()))
            .collect();

        let logger = Self {
            receivers: Arc::from(combined),
            labels: Arc::from(labels),
            ..self.clone()
        };
        logger.check_invariants();
        logger
    }

    /// Append a single receiver
    #[must_use]
    pub fn with_receiver(&self, receiver: Receiver) -> Self {
        self.with_receivers([receiver], true)
    }

    pub fn with_limits(&self, lower: u8, upper: u8) -> Result<Self> {
        let logger = Self {
            limits: Limits::new(lower, upper)?,
            ..self.clone()
        };
        logger.check_invariants();
        Ok(logger)
    }

    /// Add tags merged into every dispatched event
    pub fn with_tags<I, S>(&self, tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added: TagSet = tags.into_iter().collect();
        contract::require(
            "Logger",
            &[("tags must not be empty strings", added.iter().all(|t| !t.is_empty()))],
        )?;

        let logger = Self {
            tags: Arc::new(self.tags.merged(&added)),
            ..self.clone()
        };
        logger.check_invariants();
        Ok(logger)
    }

    /// Append a transform to the middleware chain
    #[must_use]
    pub fn with_middleware<F>(&self, transform: F) -> Self
    where
        F: Fn(Event) -> Event + Send + Sync + 'static,
    {
        let mut middleware = self.middleware.to_vec();
        middleware.push(Arc::new(transform));

        let logger = Self {
            middleware: Arc::from(middleware),
            ..self.clone()
        };
        logger.check_invariants();
        logger
    }

    /// Route contained failures to `handler` instead of stderr
    #[must_use]
    pub fn with_diagnostics(&self, handler: DiagnosticHandler) -> Self {
        let logger = Self {
            diagnostics: handler,
            ..self.clone()
        };
        logger.check_invariants();
        logger
    }

    /// Flush every receiver's sink
    ///
    /// All sinks are flushed even if one fails; the first error is returned.
    pub fn flush(&self) -> Result<()> {
        let mut first_error: Option<LoggerError> = None;
        for receiver in self.receivers.iter() {
            if let Err(e) = receiver.flush() {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    /// Diagnostic labels, one per receiver
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn receiver_names(&self) -> Vec<&str> {
        self.receivers.iter().map(Receiver::name).collect()
    }

    pub fn middleware_len(&self) -> usize {
        self.middleware.len()
    }

    /// Get the logger metrics, shared by every logger derived from this one
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    fn check_invariants(&self) {
        contract::ensure(
            "Logger",
            &[
                ("one label per receiver", self.labels.len() == self.receivers.len()),
                ("lower limit at most 99", self.limits.lower() <= 99),
                ("upper limit within [1, 100]", (1..=100).contains(&self.limits.upper())),
                ("lower limit not above upper", self.limits.lower() <= self.limits.upper()),
            ],
        );
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("limits", &self.limits)
            .field("tags", &self.tags)
            .field("receivers", &self.labels)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
