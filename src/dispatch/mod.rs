//! Delivery side of a sink: formatting, batching and background execution

pub mod buffered;
pub mod config;
pub mod deliver;
pub mod executor;
pub mod format;
pub mod registry;

pub use buffered::{BufferedSink, BufferedSinkBuilder};
pub use config::{BufferConfig, DEFAULT_FLUSH_THRESHOLD, DEFAULT_MAX_QUEUED};
pub use deliver::{Deliver, FormattedSink};
#[cfg(feature = "tokio-executor")]
pub use executor::TokioExecutor;
pub use executor::{Executor, Job, TaskHandle, ThreadExecutor, WorkerPool};
pub use format::{Format, JsonFormat, TextFormat, TimestampFormat};
pub use registry::{flush_all, live_sinks, shutdown, ShutdownReport};
