//! Deliver step and the unbuffered format+deliver sink

use super::format::Format;
use crate::core::{Event, Result, Sink};

/// Writes batches of formatted records to a backend
///
/// A batch is handed over whole, in arrival order. Implementations decide what a failed batch
/// means for their backend; the caller only learns that the batch as a whole failed.
pub trait Deliver<R>: Send + Sync {
    fn deliver(&self, batch: Vec<R>) -> Result<()>;

    /// Flush whatever the backend itself buffers
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<F, R> Deliver<R> for F
where
    F: Fn(Vec<R>) -> Result<()> + Send + Sync,
{
    fn deliver(&self, batch: Vec<R>) -> Result<()> {
        self(batch)
    }
}

/// Sink that formats each event and delivers it immediately as a one-record batch
///
/// # Example
///
/// ```
/// use rust_event_dispatch::dispatch::{FormattedSink, TextFormat};
/// use rust_event_dispatch::core::Sink;
/// use rust_event_dispatch::EventLevel;
///
/// let sink = FormattedSink::new("stdout", TextFormat::new(), |lines: Vec<String>| -> rust_event_dispatch::Result<()> {
///     for line in lines {
///         println!("{}", line);
///     }
///     Ok(())
/// });
/// sink.emit(&EventLevel::NOTE.event("ready")).unwrap();
/// ```
pub struct FormattedSink<F, D> {
    name: String,
    format: F,
    deliver: D,
}

impl<F, D> FormattedSink<F, D>
where
    F: Format,
    D: Deliver<F::Record>,
{
    pub fn new(name: impl Into<String>, format: F, deliver: D) -> Self {
        Self {
            name: name.into(),
            format,
            deliver,
        }
    }
}

impl<F, D> Sink for FormattedSink<F, D>
where
    F: Format,
    D: Deliver<F::Record>,
{
    fn emit(&self, event: &Event) -> Result<()> {
        let record = self.format.format(event)?;
        self.deliver.deliver(vec![record])
    }

    fn flush(&self) -> Result<()> {
        self.deliver.flush()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
