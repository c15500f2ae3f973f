//! Filtered, error-isolated wrappers around sinks

use super::error::{panic_message, ReceiverError, Result};
use super::event::{Event, Middleware};
use super::limits::Limits;
use super::sink::{FnSink, Sink};
use super::contract;
use std::fmt;
use std::sync::Arc;

/// One output of a logger: a sink plus its own middleware and severity limits
///
/// Receiver limits are checked after the logger's, so a receiver can be stricter than the
/// logger it is attached to. Everything a receiver runs, including its middleware, is
/// contained by [`receive`](Self::receive).
///
/// # Example
///
/// ```
/// use rust_event_dispatch::{receiver, EventLevel};
/// use rust_event_dispatch::core::FnSink;
///
/// let alerts = receiver(FnSink::new("pager", |_event: &rust_event_dispatch::Event| Ok(())))
///     .with_limits(60, 100)
///     .unwrap();
///
/// assert!(alerts.receive(&EventLevel::NOTE.event("ignored")).is_ok());
/// ```
#[derive(Clone)]
pub struct Receiver {
    sink: Arc<dyn Sink>,
    middleware: Vec<Middleware>,
    limits: Limits,
    name: String,
}

/// Wrap a sink in a receiver with no middleware and unrestricted limits
pub fn receiver<S: Sink + 'static>(sink: S) -> Receiver {
    Receiver::new(sink)
}

impl Receiver {
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        Self::from_shared(Arc::new(sink))
    }

    /// Wrap a sink that is also held elsewhere, e.g. to flush it directly
    pub fn from_shared(sink: Arc<dyn Sink>) -> Self {
        let name = sink.name().to_string();
        Self {
            sink,
            middleware: Vec::new(),
            limits: Limits::ALL,
            name,
        }
    }

    /// Receiver backed by a closure sink
    pub fn from_fn<F>(name: impl Into<String>, emit: F) -> Self
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(FnSink::new(name, emit))
    }

    /// Override the name used in diagnostics
    pub fn with_name(self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        contract::require(
            "Receiver",
            &[("receiver name must not be empty", !name.trim().is_empty())],
        )?;
        Ok(Self { name, ..self })
    }

    pub fn with_limits(self, lower: u8, upper: u8) -> Result<Self> {
        let limits = Limits::new(lower, upper)?;
        Ok(Self { limits, ..self })
    }

    /// Append a transform applied before this receiver's filter
    pub fn with_middleware<F>(mut self, transform: F) -> Self
    where
        F: Fn(Event) -> Event + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(transform));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Run middleware, filter and sink for one event
    ///
    /// Returns `Ok(())` whether or not the sink fired. Errors and panics from any stage are
    /// converted into a [`ReceiverError`]; nothing escapes the call.
    pub fn receive(&self, event: &Event) -> std::result::Result<(), ReceiverError> {
        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.process(event)));

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ReceiverError::failed(&self.name, e.to_string())),
            Err(payload) => Err(ReceiverError::panicked(
                &self.name,
                panic_message(payload.as_ref()),
            )),
        }
    }

    fn process(&self, event: &Event) -> Result<()> {
        if self.middleware.is_empty() {
            if !self.limits.admits(event.severity()) {
                return Ok(());
            }
            return self.sink.emit(event);
        }

        let transformed = self
            .middleware
            .iter()
            .fold(event.clone(), |current, transform| transform(current));

        if !self.limits.admits(transformed.severity()) {
            return Ok(());
        }
        self.sink.emit(&transformed)
    }

    pub fn flush(&self) -> Result<()> {
        self.sink.flush()
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("name", &self.name)
            .field("limits", &self.limits)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
