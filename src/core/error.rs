//! Error types for the dispatch pipeline

use std::any::Any;
use std::fmt;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid construction arguments for a logger, receiver, level or buffer
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A receiver failed while handling an event
    #[error(transparent)]
    Receiver(#[from] ReceiverError),

    /// A background batch delivery failed
    #[error("Async delivery failed for '{sink}' ({records} records): {message}")]
    AsyncDelivery {
        sink: String,
        records: usize,
        message: String,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Backend delivery failure
    #[error("Delivery error: {0}")]
    DeliveryError(String),

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// The execution facility refused a unit of work
    #[error("Executor rejected work: {0}")]
    ExecutorRejected(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an async delivery error
    pub fn async_delivery(
        sink: impl Into<String>,
        records: usize,
        message: impl Into<String>,
    ) -> Self {
        LoggerError::AsyncDelivery {
            sink: sink.into(),
            records,
            message: message.into(),
        }
    }

    /// Create a delivery error
    pub fn delivery<S: Into<String>>(msg: S) -> Self {
        LoggerError::DeliveryError(msg.into())
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create an executor rejection error
    pub fn executor_rejected<S: Into<String>>(msg: S) -> Self {
        LoggerError::ExecutorRejected(msg.into())
    }

    /// Whether this error stems from invalid construction arguments
    pub fn is_configuration(&self) -> bool {
        matches!(self, LoggerError::InvalidConfiguration { .. })
    }
}

/// Failure of a single receiver during dispatch
///
/// Produced by [`Receiver::receive`](crate::core::Receiver::receive) and contained by the
/// logger: it is reported through diagnostics and never reaches the caller of `log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverError {
    pub receiver: String,
    pub message: String,
    pub panicked: bool,
}

impl fmt::Display for ReceiverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.panicked { "panicked" } else { "failed" };
        write!(f, "Receiver '{}' {}: {}", self.receiver, outcome, self.message)
    }
}

impl std::error::Error for ReceiverError {}

impl ReceiverError {
    pub fn failed(receiver: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            message: message.into(),
            panicked: false,
        }
    }

    pub fn panicked(receiver: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            message: message.into(),
            panicked: true,
        }
    }
}

/// Extract a readable message from a `catch_unwind` payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
