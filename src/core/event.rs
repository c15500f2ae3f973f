//! Immutable event records

use super::contract;
use super::event_level::EventLevel;
use super::fields::{FieldValue, Fields};
use super::tags::TagSet;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// An `Event -> Event` transform applied by loggers and receivers
///
/// A transform may return its input unchanged. A panicking logger middleware propagates to
/// the caller; a panicking receiver middleware is contained by the receiver.
pub type Middleware = Arc<dyn Fn(Event) -> Event + Send + Sync>;

/// One log record
///
/// Events are values: every `with_*` method consumes the event and returns a new one, so a
/// middleware transform can never alter a record someone else still holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    timestamp: DateTime<Utc>,
    level: EventLevel,
    message: String,
    #[serde(skip_serializing_if = "TagSet::is_empty")]
    tags: TagSet,
    #[serde(skip_serializing_if = "Fields::is_empty")]
    fields: Fields,
}

impl Event {
    /// Create an event stamped with the current time
    ///
    /// The level's default tags, if any, are pre-merged.
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        contract::ensure(
            "Event",
            &[("severity must be within [0, 100]", level.severity() <= 100)],
        );

        let tags = level.default_tags().cloned().unwrap_or_default();
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            tags,
            fields: Fields::new(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> &EventLevel {
        &self.level
    }

    #[inline]
    pub fn severity(&self) -> u8 {
        self.level.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_level(self, level: EventLevel) -> Self {
        Self { level, ..self }
    }

    #[must_use]
    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, ..self }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Ordered union with `tags`: existing tags keep their position, new ones are appended
    #[must_use]
    pub fn with_tags(self, tags: &TagSet) -> Self {
        Self {
            tags: self.tags.merged(tags),
            ..self
        }
    }

    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields = self.fields.with(key, value);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        for (key, value) in fields.iter() {
            self.fields = self.fields.with(key, value.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = EventLevel::NOTE.event("started");
        assert_eq!(event.severity(), 30);
        assert_eq!(event.message(), "started");
        assert!(event.tags().is_empty());
        assert!(event.fields().is_empty());
    }

    #[test]
    fn test_transforms_produce_new_values() {
        let original = EventLevel::MESSAGE.event("hello");
        let changed = original.clone().with_message("bye").with_tag("greeting");

        assert_eq!(original.message(), "hello");
        assert!(original.tags().is_empty());
        assert_eq!(changed.message(), "bye");
        assert!(changed.tags().contains("greeting"));
        assert_eq!(changed.timestamp(), original.timestamp());
    }

    #[test]
    fn test_with_tags_merges_in_order() {
        let event = EventLevel::MESSAGE
            .event("x")
            .with_tag("b")
            .with_tag("a")
            .with_tags(&["a", "c"].into_iter().collect());
        assert_eq!(event.tags().iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_with_fields() {
        let event = EventLevel::ERROR
            .event("failed")
            .with_field("code", 500)
            .with_fields(Fields::new().with("path", "/api").with("code", 503));

        assert_eq!(event.field("code"), Some(&FieldValue::Int(503)));
        assert_eq!(event.field("path"), Some(&FieldValue::from("/api")));
    }

    #[test]
    fn test_serialize() {
        let event = EventLevel::WARNING.event("slow").with_tag("db").with_field("ms", 1200);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["level"]["name"], "WARNING");
        assert_eq!(json["message"], "slow");
        assert_eq!(json["tags"], serde_json::json!(["db"]));
        assert_eq!(json["fields"]["ms"], 1200);
        assert!(json["timestamp"].is_string());
    }
}
