//! Contract checks used by every constructor and builder
//!
//! Conditions are passed as ordered `(description, holds)` pairs and the first failing one
//! is named in the resulting error. Checks are plain comparisons and always run.
//!
//! - [`require`] validates caller-supplied arguments and returns a configuration error.
//! - [`ensure`] validates internal invariants and panics: a broken invariant is a defect in
//!   this crate, not something a caller can recover from.

use super::error::{LoggerError, Result};

/// Validate preconditions, returning `InvalidConfiguration` for the first failing condition
///
/// # Example
///
/// ```
/// use rust_event_dispatch::core::contract;
///
/// let lower = 60;
/// let upper = 30;
/// let err = contract::require("Limits", &[
///     ("lower must be at most 99", lower <= 99),
///     ("lower must not exceed upper", lower <= upper),
/// ])
/// .unwrap_err();
/// assert!(err.to_string().contains("lower must not exceed upper"));
/// ```
#[inline]
pub fn require(component: &str, conditions: &[(&str, bool)]) -> Result<()> {
    match first_failure(conditions) {
        Some(description) => Err(LoggerError::config(component, description)),
        None => Ok(()),
    }
}

/// Validate invariants, panicking with a contract violation for the first failing condition
#[inline]
#[track_caller]
pub fn ensure(component: &str, conditions: &[(&str, bool)]) {
    if let Some(description) = first_failure(conditions) {
        panic!("Contract violation in {}: {}", component, description);
    }
}

#[inline]
fn first_failure<'a>(conditions: &[(&'a str, bool)]) -> Option<&'a str> {
    conditions
        .iter()
        .find(|(_, holds)| !holds)
        .map(|(description, _)| *description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_passes_when_all_hold() {
        assert!(require("Test", &[("a", true), ("b", true)]).is_ok());
        assert!(require("Test", &[]).is_ok());
    }

    #[test]
    fn test_require_names_first_failure() {
        let err = require("Limits", &[("first", true), ("second", false), ("third", false)])
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Invalid configuration for Limits: second");
    }

    #[test]
    #[should_panic(expected = "Contract violation in Logger: labels match receivers")]
    fn test_ensure_panics_on_violation() {
        ensure("Logger", &[("labels match receivers", false)]);
    }

    #[test]
    fn test_ensure_silent_when_all_hold() {
        ensure("Logger", &[("always", true)]);
    }
}
