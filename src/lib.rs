//! # Rust Event Dispatch
//!
//! An event-dispatch pipeline that routes immutable log events from one call site to any
//! number of independently configured sinks.
//!
//! ## Features
//!
//! - **Composable**: loggers are immutable values; every `with_*` builder returns a new one
//! - **Two-level filtering**: severity limits on the logger and on each receiver
//! - **Failure isolation**: a failing or panicking sink never stops delivery to the others
//! - **Buffered delivery**: batching with synchronous or executor-backed flushes and explicit
//!   backpressure
//!
//! ## Example
//!
//! ```
//! use rust_event_dispatch::prelude::*;
//!
//! let console = Receiver::from_fn("console", |event| {
//!     println!("[{}] {}", event.level(), event.message());
//!     Ok(())
//! });
//!
//! let app = logger()
//!     .with_receivers([console], true)
//!     .with_limits(30, 100)
//!     .unwrap()
//!     .with_tags(["api"])
//!     .unwrap();
//!
//! let event = app.log(EventLevel::WARNING.event("slow request").with_field("ms", 950));
//! assert!(event.tags().contains("api"));
//! ```

pub mod core;
pub mod dispatch;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        logger, receiver, Diagnostic, DiagnosticHandler, DispatchMetrics, Event, EventLevel,
        FieldValue, Fields, Limits, Logger, LoggerError, OverflowPolicy, Receiver, Result, Sink,
        TagSet,
    };
    pub use crate::dispatch::{
        shutdown, BufferConfig, BufferedSink, Deliver, Executor, Format, FormattedSink,
        JsonFormat, TextFormat, ThreadExecutor, WorkerPool,
    };
}

pub use crate::core::{
    flush, logger, receiver, BufferMetrics, Diagnostic, DiagnosticHandler, DispatchMetrics,
    Event, EventLevel, FieldValue, Fields, LevelRegistry, Limits, Logger, LoggerError,
    OverflowPolicy, Receiver, ReceiverError, Result, Sink, TagSet, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::dispatch::{
    flush_all, live_sinks, shutdown, BufferConfig, BufferedSink, ShutdownReport,
};
