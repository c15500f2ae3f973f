//! Format step: pure conversion of an event into a backend-shaped record
//!
//! Any `Fn(&Event) -> R` closure is a [`Format`]. Two reference formats are provided so the
//! format/deliver seam can be used without writing one: [`TextFormat`] producing one line per
//! event and [`JsonFormat`] producing one JSON object per event.

use crate::core::{Event, LoggerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Converts events into records a [`Deliver`](super::Deliver) implementation accepts
pub trait Format: Send + Sync {
    type Record: Send + 'static;

    fn format(&self, event: &Event) -> Result<Self::Record>;
}

impl<F, R> Format for F
where
    F: Fn(&Event) -> R + Send + Sync,
    R: Send + 'static,
{
    type Record = R;

    fn format(&self, event: &Event) -> Result<R> {
        Ok(self(event))
    }
}

/// Timestamp rendering options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// RFC 3339 format: `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}

/// Human-readable single-line format
///
/// Example: `[2025-01-08T10:30:45.123Z] [WARNING ] disk almost full #disk free_mb=120`
#[derive(Debug, Clone, Default)]
pub struct TextFormat {
    timestamp_format: TimestampFormat,
}

impl TextFormat {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Escape line breaks so one event always renders as one line
    fn sanitize(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }
}

impl Format for TextFormat {
    type Record = String;

    fn format(&self, event: &Event) -> Result<String> {
        let mut line = format!(
            "[{}] [{:8}] {}",
            self.timestamp_format.format(&event.timestamp()),
            event.level(),
            Self::sanitize(event.message())
        );

        if !event.tags().is_empty() {
            line.push(' ');
            line.push_str(&event.tags().to_string());
        }
        if !event.fields().is_empty() {
            line.push(' ');
            line.push_str(&Self::sanitize(&event.fields().format_fields()));
        }
        Ok(line)
    }
}

/// One JSON object per event
///
/// Example: `{"timestamp":"2025-01-08T10:30:45.123Z","level":"WARNING","severity":60,"message":"disk almost full"}`
#[derive(Debug, Clone, Default)]
pub struct JsonFormat {
    timestamp_format: TimestampFormat,
}

impl JsonFormat {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn timestamp_value(&self, event: &Event) -> serde_json::Value {
        match self.timestamp_format {
            TimestampFormat::UnixMillis => {
                serde_json::Value::Number(event.timestamp().timestamp_millis().into())
            }
            _ => serde_json::Value::String(self.timestamp_format.format(&event.timestamp())),
        }
    }
}

impl Format for JsonFormat {
    type Record = String;

    fn format(&self, event: &Event) -> Result<String> {
        let mut json_obj = serde_json::Map::new();
        json_obj.insert("timestamp".to_string(), self.timestamp_value(event));
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(event.level().name().to_string()),
        );
        json_obj.insert(
            "severity".to_string(),
            serde_json::Value::Number(event.severity().into()),
        );
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(event.message().to_string()),
        );

        if !event.tags().is_empty() {
            json_obj.insert("tags".to_string(), serde_json::to_value(event.tags())?);
        }
        if !event.fields().is_empty() {
            let fields = event
                .fields()
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_json_value()))
                .collect();
            json_obj.insert("fields".to_string(), serde_json::Value::Object(fields));
        }

        serde_json::to_string(&serde_json::Value::Object(json_obj))
            .map_err(|e| LoggerError::formatter("JSON", e.to_string()))
    }
}
