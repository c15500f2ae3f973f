//! Side channel for failures the pipeline contains instead of raising
//!
//! A logger cannot report its own failures by logging them: a broken receiver would be
//! re-entered by its own error report. Contained failures are therefore handed to a
//! [`DiagnosticHandler`], which by default writes a single line to stderr.

use super::error::{panic_message, LoggerError, ReceiverError};
use super::overflow_policy::OverflowPolicy;
use std::fmt;
use std::sync::Arc;

/// Callback receiving contained failures
pub type DiagnosticHandler = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A receiver failed or panicked during fan-out
    ReceiverFailed {
        index: usize,
        label: String,
        error: ReceiverError,
    },

    /// A batch submitted to an executor could not be delivered
    AsyncDeliveryFailed {
        sink: String,
        records: usize,
        message: String,
    },

    /// A synchronous batch delivery failed; the batch is discarded
    BatchDiscarded {
        sink: String,
        records: usize,
        message: String,
    },

    /// Records were shed by an explicit overflow policy
    RecordsDropped {
        sink: String,
        policy: OverflowPolicy,
        total_dropped: u64,
    },

    /// The executor refused a batch, which was delivered on the producer's thread instead
    ExecutorFallback { sink: String, message: String },

    /// Draining a buffered sink at drop or shutdown failed
    DrainFailed { sink: String, message: String },
}

impl Diagnostic {
    /// Whether this diagnostic reports lost or undelivered records
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Diagnostic::ExecutorFallback { .. } | Diagnostic::RecordsDropped { .. }
        )
    }

    /// Convert an error diagnostic back into the error it contains
    ///
    /// Returns `None` for warnings. Hosts that want contained failures to escalate can
    /// forward the result from their own handler.
    pub fn to_error(&self) -> Option<LoggerError> {
        match self {
            Diagnostic::ReceiverFailed { error, .. } => Some(LoggerError::Receiver(error.clone())),
            Diagnostic::AsyncDeliveryFailed {
                sink,
                records,
                message,
            } => Some(LoggerError::async_delivery(sink, *records, message)),
            Diagnostic::BatchDiscarded { .. } | Diagnostic::DrainFailed { .. } => {
                Some(LoggerError::delivery(self.to_string()))
            }
            Diagnostic::RecordsDropped { .. } | Diagnostic::ExecutorFallback { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ReceiverFailed {
                index,
                label,
                error,
            } => {
                let outcome = if error.panicked { "panicked" } else { "failed" };
                write!(
                    f,
                    "Receiver #{} ({}) {}: {}. Other receivers continue to function.",
                    index, label, outcome, error.message
                )
            }
            Diagnostic::AsyncDeliveryFailed {
                sink,
                records,
                message,
            } => write!(
                f,
                "Async delivery of {} records to '{}' failed: {}",
                records, sink, message
            ),
            Diagnostic::BatchDiscarded {
                sink,
                records,
                message,
            } => write!(
                f,
                "Delivery of {} records to '{}' failed, batch discarded: {}",
                records, sink, message
            ),
            Diagnostic::RecordsDropped {
                sink,
                policy,
                total_dropped,
            } => write!(
                f,
                "Queue of '{}' full, {} records dropped under {} policy. \
                 Consider increasing max_queued or using a blocking overflow policy.",
                sink, total_dropped, policy
            ),
            Diagnostic::ExecutorFallback { sink, message } => write!(
                f,
                "Executor rejected batch for '{}' ({}), delivered synchronously",
                sink, message
            ),
            Diagnostic::DrainFailed { sink, message } => {
                write!(f, "Failed to drain '{}' during shutdown: {}", sink, message)
            }
        }
    }
}

/// Handler writing `[LOGGER ERROR]` / `[LOGGER WARNING]` lines to stderr
pub fn stderr_handler() -> DiagnosticHandler {
    Arc::new(|diagnostic: &Diagnostic| {
        if diagnostic.is_error() {
            eprintln!("[LOGGER ERROR] {}", diagnostic);
        } else {
            eprintln!("[LOGGER WARNING] {}", diagnostic);
        }
    })
}

/// Handler discarding every diagnostic
pub fn silent_handler() -> DiagnosticHandler {
    Arc::new(|_: &Diagnostic| {})
}

/// Deliver a diagnostic, containing any panic raised by the handler itself
pub(crate) fn report(handler: &DiagnosticHandler, diagnostic: Diagnostic) {
    let outcome =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(&diagnostic)));
    if let Err(payload) = outcome {
        eprintln!(
            "[LOGGER CRITICAL] Diagnostic handler panicked: {}. Original diagnostic: {}",
            panic_message(payload.as_ref()),
            diagnostic
        );
    }
}
