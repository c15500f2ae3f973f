//! Event severity levels
//!
//! Nine built-in levels form a fixed, totally ordered scale from [`EventLevel::LOWEST`] (0)
//! to [`EventLevel::HIGHEST`] (100). The two bounds are virtual: they exist so limits can be
//! expressed as closed ranges, and custom levels must fall strictly between them.
//!
//! Levels compare by severity only. A custom level sharing a severity with another level is
//! equal to it regardless of name.

use super::contract;
use super::error::{LoggerError, Result};
use super::event::Event;
use super::tags::TagSet;
use parking_lot::RwLock;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Lowest severity a custom level may use
pub const MIN_CUSTOM_SEVERITY: u8 = 1;

/// Highest severity a custom level may use
pub const MAX_CUSTOM_SEVERITY: u8 = 99;

#[derive(Debug, Clone)]
pub struct EventLevel {
    name: Cow<'static, str>,
    severity: u8,
    builtin: bool,
    default_tags: Option<Arc<TagSet>>,
}

impl EventLevel {
    pub const LOWEST: EventLevel = EventLevel::builtin("LOWEST", 0);
    pub const TRACE: EventLevel = EventLevel::builtin("TRACE", 10);
    pub const DEBUG: EventLevel = EventLevel::builtin("DEBUG", 20);
    pub const NOTE: EventLevel = EventLevel::builtin("NOTE", 30);
    pub const MESSAGE: EventLevel = EventLevel::builtin("MESSAGE", 40);
    pub const WARNING: EventLevel = EventLevel::builtin("WARNING", 60);
    pub const ERROR: EventLevel = EventLevel::builtin("ERROR", 80);
    pub const CRITICAL: EventLevel = EventLevel::builtin("CRITICAL", 90);
    pub const HIGHEST: EventLevel = EventLevel::builtin("HIGHEST", 100);

    /// The built-in levels in ascending severity
    pub const BUILTIN: [EventLevel; 9] = [
        EventLevel::LOWEST,
        EventLevel::TRACE,
        EventLevel::DEBUG,
        EventLevel::NOTE,
        EventLevel::MESSAGE,
        EventLevel::WARNING,
        EventLevel::ERROR,
        EventLevel::CRITICAL,
        EventLevel::HIGHEST,
    ];

    const fn builtin(name: &'static str, severity: u8) -> Self {
        Self {
            name: Cow::Borrowed(name),
            severity,
            builtin: true,
            default_tags: None,
        }
    }

    /// Define a custom level
    ///
    /// Severity must lie in `[1, 99]`; 0 and 100 are reserved for the virtual bounds.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_event_dispatch::EventLevel;
    ///
    /// let audit = EventLevel::custom("AUDIT", 70).unwrap();
    /// assert!(audit > EventLevel::WARNING);
    /// assert!(EventLevel::custom("BROKEN", 100).is_err());
    /// ```
    pub fn custom(name: impl Into<String>, severity: u8) -> Result<Self> {
        let name = name.into();
        contract::require(
            "EventLevel",
            &[
                ("custom level name must not be empty", !name.trim().is_empty()),
                (
                    "custom level severity must be in [1, 99]",
                    (MIN_CUSTOM_SEVERITY..=MAX_CUSTOM_SEVERITY).contains(&severity),
                ),
            ],
        )?;

        Ok(Self {
            name: Cow::Owned(name),
            severity,
            builtin: false,
            default_tags: None,
        })
    }

    /// Attach default tags merged into every event this level constructs
    ///
    /// Only custom levels accept tags, and only once.
    pub fn with_default_tags<I, S>(self, tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: TagSet = tags.into_iter().collect();
        contract::require(
            "EventLevel",
            &[
                ("default tags cannot be attached to a built-in level", !self.builtin),
                ("default tags are already attached", self.default_tags.is_none()),
                ("default tags must not be empty strings", tags.iter().all(|t| !t.is_empty())),
            ],
        )?;

        Ok(Self {
            default_tags: Some(Arc::new(tags)),
            ..self
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn severity(&self) -> u8 {
        self.severity
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn default_tags(&self) -> Option<&TagSet> {
        self.default_tags.as_deref()
    }

    /// Construct an event at this level
    ///
    /// # Example
    ///
    /// ```
    /// use rust_event_dispatch::EventLevel;
    ///
    /// let event = EventLevel::WARNING.event("disk almost full").with_field("free_mb", 120);
    /// assert_eq!(event.severity(), 60);
    /// ```
    pub fn event(&self, message: impl Into<String>) -> Event {
        Event::new(self.clone(), message)
    }

    /// Look up a built-in level by name (case-insensitive)
    pub fn builtin_named(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        let upper = match upper.as_str() {
            "WARN" => "WARNING",
            "FATAL" => "CRITICAL",
            "INFO" => "MESSAGE",
            other => other,
        };
        Self::BUILTIN.into_iter().find(|level| level.name == upper)
    }
}

impl PartialEq for EventLevel {
    fn eq(&self, other: &Self) -> bool {
        self.severity == other.severity
    }
}

impl Eq for EventLevel {}

impl PartialOrd for EventLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity.cmp(&other.severity)
    }
}

impl Hash for EventLevel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.severity.hash(state);
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

impl Serialize for EventLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EventLevel", 2)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("severity", &self.severity)?;
        state.end()
    }
}

impl FromStr for EventLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::builtin_named(s).ok_or_else(|| format!("Invalid event level: '{}'", s))
    }
}

/// Registry of every level known to an application
///
/// Created with the built-in set already registered; custom levels are added with
/// [`define_custom`](Self::define_custom). Names are unique and matched case-insensitively.
#[derive(Debug)]
pub struct LevelRegistry {
    levels: RwLock<BTreeMap<String, EventLevel>>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        let registry = Self {
            levels: RwLock::new(BTreeMap::new()),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&self) {
        let mut levels = self.levels.write();
        for level in EventLevel::BUILTIN {
            levels.insert(level.name().to_uppercase(), level);
        }
    }

    /// Define and register a custom level
    pub fn define_custom(&self, name: impl Into<String>, severity: u8) -> Result<EventLevel> {
        let level = EventLevel::custom(name, severity)?;
        let key = level.name().to_uppercase();

        let mut levels = self.levels.write();
        contract::require(
            "LevelRegistry",
            &[("level name is already registered", !levels.contains_key(&key))],
        )?;
        levels.insert(key, level.clone());
        Ok(level)
    }

    /// Attach default tags to a registered custom level, returning the updated level
    pub fn attach_default_tags<I, S>(&self, name: &str, tags: I) -> Result<EventLevel>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = name.to_uppercase();
        let mut levels = self.levels.write();
        let current = levels
            .get(&key)
            .cloned()
            .ok_or_else(|| LoggerError::config("LevelRegistry", "level is not registered"))?;
        let tagged = current.with_default_tags(tags)?;
        levels.insert(key, tagged.clone());
        Ok(tagged)
    }

    pub fn get(&self, name: &str) -> Option<EventLevel> {
        self.levels.read().get(&name.to_uppercase()).cloned()
    }

    /// All registered levels in ascending severity
    pub fn levels(&self) -> Vec<EventLevel> {
        let mut levels: Vec<EventLevel> = self.levels.read().values().cloned().collect();
        levels.sort_by_key(|level| level.severity());
        levels
    }

    pub fn len(&self) -> usize {
        self.levels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.read().is_empty()
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
