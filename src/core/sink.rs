//! Sink trait for event output destinations

use super::{error::Result, event::Event};

/// Terminal delivery operation of a receiver
///
/// Sinks take `&self`: a logger shares its receivers between clones, so any mutable state a
/// sink needs (buffers, handles, counters) lives behind its own synchronization.
pub trait Sink: Send + Sync {
    fn emit(&self, event: &Event) -> Result<()>;

    /// Push any buffered output to the backend
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Manually drain a sink's buffer
pub fn flush(sink: &dyn Sink) -> Result<()> {
    sink.flush()
}

/// Sink backed by a closure
///
/// # Example
///
/// ```
/// use rust_event_dispatch::core::{FnSink, Sink};
/// use rust_event_dispatch::EventLevel;
///
/// let sink = FnSink::new("stdout", |event: &rust_event_dispatch::Event| {
///     println!("{}", event.message());
///     Ok(())
/// });
/// sink.emit(&EventLevel::NOTE.event("hello")).unwrap();
/// ```
pub struct FnSink<F> {
    name: String,
    emit: F,
}

impl<F> FnSink<F>
where
    F: Fn(&Event) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, emit: F) -> Self {
        Self {
            name: name.into(),
            emit,
        }
    }
}

impl<F> Sink for FnSink<F>
where
    F: Fn(&Event) -> Result<()> + Send + Sync,
{
    fn emit(&self, event: &Event) -> Result<()> {
        (self.emit)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
