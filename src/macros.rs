//! Logging macros for ergonomic event construction.
//!
//! Each macro formats its arguments like `format!`, builds an event at the matching level
//! and passes it to the logger. The macro evaluates to the event the logger returns.
//!
//! # Examples
//!
//! ```
//! use rust_event_dispatch::prelude::*;
//! use rust_event_dispatch::note;
//!
//! let logger = logger();
//!
//! // Basic logging
//! note!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! let event = note!(logger, "Server listening on port {}", port);
//! assert_eq!(event.message(), "Server listening on port 8080");
//! ```

/// Log a message at any level with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_event_dispatch::prelude::*;
/// # let logger = logger();
/// use rust_event_dispatch::log;
/// log!(logger, EventLevel::MESSAGE, "Simple message");
/// log!(logger, EventLevel::ERROR, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level.event(format!($($arg)+)))
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_event_dispatch::prelude::*;
/// # let logger = logger();
/// use rust_event_dispatch::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::EventLevel::TRACE, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::EventLevel::DEBUG, $($arg)+)
    };
}

/// Log a note-level message.
#[macro_export]
macro_rules! note {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::EventLevel::NOTE, $($arg)+)
    };
}

/// Log a message-level event.
///
/// # Examples
///
/// ```
/// # use rust_event_dispatch::prelude::*;
/// # let logger = logger();
/// use rust_event_dispatch::message;
/// message!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! message {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::EventLevel::MESSAGE, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::EventLevel::WARNING, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_event_dispatch::prelude::*;
/// # let logger = logger();
/// use rust_event_dispatch::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::EventLevel::ERROR, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::EventLevel::CRITICAL, $($arg)+)
    };
}
