//! Severity ranges used by loggers and receivers

use super::contract;
use super::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed severity range `[lower, upper]`
///
/// `lower` is at most 99 and `upper` at least 1, so no range can exclude every custom level
/// by construction alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct Limits {
    lower: u8,
    upper: u8,
}

impl Limits {
    /// The unrestricted range `[0, 100]`
    pub const ALL: Limits = Limits {
        lower: 0,
        upper: 100,
    };

    pub fn new(lower: u8, upper: u8) -> Result<Self> {
        contract::require(
            "Limits",
            &[
                ("lower limit must be at most 99", lower <= 99),
                ("upper limit must be at least 1", upper >= 1),
                ("upper limit must be at most 100", upper <= 100),
                ("lower limit must not exceed upper limit", lower <= upper),
            ],
        )?;
        Ok(Self { lower, upper })
    }

    #[inline]
    pub fn lower(&self) -> u8 {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> u8 {
        self.upper
    }

    #[inline]
    pub fn admits(&self, severity: u8) -> bool {
        (self.lower..=self.upper).contains(&severity)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::ALL
    }
}

impl TryFrom<(u8, u8)> for Limits {
    type Error = String;

    fn try_from((lower, upper): (u8, u8)) -> std::result::Result<Self, Self::Error> {
        Limits::new(lower, upper).map_err(|e| e.to_string())
    }
}

impl From<Limits> for (u8, u8) {
    fn from(limits: Limits) -> Self {
        (limits.lower, limits.upper)
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_admits_everything() {
        let limits = Limits::default();
        assert!(limits.admits(0));
        assert!(limits.admits(100));
        assert_eq!(limits.to_string(), "[0, 100]");
    }

    #[test]
    fn test_validation() {
        assert!(Limits::new(30, 100).is_ok());
        assert!(Limits::new(99, 99).is_ok());
        assert!(Limits::new(100, 100).is_err());
        assert!(Limits::new(0, 0).is_err());
        assert!(Limits::new(0, 101).is_err());

        let err = Limits::new(60, 30).unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_admits_is_inclusive() {
        let limits = Limits::new(30, 60).unwrap();
        assert!(!limits.admits(29));
        assert!(limits.admits(30));
        assert!(limits.admits(60));
        assert!(!limits.admits(61));
    }

    #[test]
    fn test_deserialize_validates() {
        let limits: Limits = serde_json::from_str("[10, 90]").unwrap();
        assert_eq!(limits, Limits::new(10, 90).unwrap());
        assert!(serde_json::from_str::<Limits>("[90, 10]").is_err());
    }
}
