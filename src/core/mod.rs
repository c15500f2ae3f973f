//! Core pipeline types: levels, events, receivers and the logger

pub mod contract;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod event_level;
pub mod fields;
pub mod limits;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod receiver;
pub mod sink;
pub mod tags;

pub use diagnostics::{silent_handler, stderr_handler, Diagnostic, DiagnosticHandler};
pub use error::{LoggerError, ReceiverError, Result};
pub use event::{Event, Middleware};
pub use event_level::{EventLevel, LevelRegistry, MAX_CUSTOM_SEVERITY, MIN_CUSTOM_SEVERITY};
pub use fields::{FieldValue, Fields};
pub use limits::Limits;
pub use logger::{logger, Logger, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::{BufferMetrics, DispatchMetrics};
pub use overflow_policy::OverflowPolicy;
pub use receiver::{receiver, Receiver};
pub use sink::{flush, FnSink, Sink};
pub use tags::TagSet;
