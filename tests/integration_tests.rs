//! Integration tests for the dispatch pipeline
//!
//! These tests verify:
//! - Logger-level and receiver-level filtering
//! - Receiver failure isolation
//! - Immutability of loggers under `with_*`
//! - Tag merging and custom level default tags
//! - File delivery through the format/deliver seam
//! - Buffered delivery behind a logger

use parking_lot::Mutex;
use rust_event_dispatch::core::{Diagnostic, DiagnosticHandler};
use rust_event_dispatch::dispatch::{BufferedSink, FormattedSink, JsonFormat, TextFormat};
use rust_event_dispatch::prelude::*;
use rust_event_dispatch::LevelRegistry;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn counting(name: &str) -> (Receiver, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = Arc::clone(&count);
    let receiver = Receiver::from_fn(name, move |_event| {
        count_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (receiver, count)
}

fn capturing_diagnostics() -> (DiagnosticHandler, Arc<Mutex<Vec<Diagnostic>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let handler: DiagnosticHandler =
        Arc::new(move |d: &Diagnostic| seen_clone.lock().push(d.clone()));
    (handler, seen)
}

/// Appends each batch to a file, one record per line
fn file_delivery(path: PathBuf) -> impl Fn(Vec<String>) -> Result<()> + Send + Sync + 'static {
    move |batch: Vec<String>| -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        for line in batch {
            writeln!(file, "{}", line)?;
        }
        file.flush()?;
        Ok(())
    }
}

#[test]
fn test_end_to_end_limits() {
    let (receiver, count) = counting("alerts");
    let logger = logger()
        .with_receivers([receiver], true)
        .with_limits(60, 100)
        .unwrap();

    for level in [EventLevel::TRACE, EventLevel::WARNING, EventLevel::ERROR] {
        logger.log(level.event("sample"));
    }

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(logger.metrics().filtered_count(), 1);
    assert_eq!(logger.metrics().dispatched_count(), 2);
}

#[test]
fn test_out_of_range_event_is_still_returned() {
    let (receiver, count) = counting("any");
    let logger = logger()
        .with_receiver(receiver)
        .with_limits(80, 100)
        .unwrap()
        .with_tags(["svc"])
        .unwrap();

    let event = logger.log(EventLevel::NOTE.event("quiet"));
    assert_eq!(event.message(), "quiet");
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_two_level_filtering() {
    let (all, all_count) = counting("all");
    let (alerts, alert_count) = counting("alerts");
    let logger = logger()
        .with_receivers([all, alerts.with_limits(60, 100).unwrap()], true)
        .with_limits(30, 100)
        .unwrap();

    logger.log(EventLevel::DEBUG.event("below logger"));
    logger.log(EventLevel::NOTE.event("logger only"));
    logger.log(EventLevel::ERROR.event("both"));

    assert_eq!(all_count.load(Ordering::SeqCst), 2);
    assert_eq!(alert_count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_receiver_is_isolated() {
    let (first, first_count) = counting("first");
    let (last, last_count) = counting("last");
    let broken = Receiver::from_fn("broken", |_event| panic!("sink exploded"));
    let (handler, diagnostics) = capturing_diagnostics();

    let logger = logger()
        .with_receivers([first, broken, last], true)
        .with_diagnostics(handler);

    let event = logger.log(EventLevel::ERROR.event("must reach both"));

    assert_eq!(event.message(), "must reach both");
    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(last_count.load(Ordering::SeqCst), 1);
    assert_eq!(logger.metrics().receiver_failures(), 1);

    let diagnostics = diagnostics.lock();
    assert_eq!(diagnostics.len(), 1);
    match &diagnostics[0] {
        Diagnostic::ReceiverFailed { index, label, error } => {
            assert_eq!(*index, 1);
            assert_eq!(label, "#1 broken");
            assert!(error.panicked);
            assert_eq!(error.message, "sink exploded");
        }
        other => panic!("unexpected diagnostic: {:?}", other),
    }
}

#[test]
fn test_with_receivers_replace_leaves_original_unchanged() {
    let (a, a_count) = counting("a");
    let (b, b_count) = counting("b");

    let original = logger().with_receiver(a);
    let replaced = original.with_receivers([b], false);

    assert_eq!(original.receiver_names(), vec!["a"]);
    assert_eq!(replaced.receiver_names(), vec!["b"]);

    original.log(EventLevel::NOTE.event("x"));
    assert_eq!(a_count.load(Ordering::SeqCst), 1);
    assert_eq!(b_count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_tag_merge_keeps_event_tags_first() {
    let logger = logger().with_tags(["a"]).unwrap();
    let event = logger.log(EventLevel::NOTE.event("x").with_tag("b").with_tag("a"));

    let tags: Vec<&str> = event.tags().iter().collect();
    assert_eq!(tags, vec!["b", "a"]);
}

#[test]
fn test_custom_level_default_tags_reach_sink() {
    let registry = LevelRegistry::new();
    registry.define_custom("AUDIT", 70).unwrap();
    let audit = registry.attach_default_tags("audit", ["compliance"]).unwrap();
    assert!(registry.attach_default_tags("AUDIT", ["again"]).is_err());
    assert!(registry.attach_default_tags("ERROR", ["x"]).is_err());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let logger = logger()
        .with_receiver(Receiver::from_fn("audit-log", move |event| {
            seen_clone.lock().push(event.tags().to_string());
            Ok(())
        }))
        .with_tags(["svc"])
        .unwrap();

    logger.log(audit.event("user deleted"));
    assert_eq!(*seen.lock(), vec!["#compliance #svc".to_string()]);
}

#[test]
fn test_middleware_order_across_levels() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let receiver = Receiver::from_fn("capture", move |event| {
        seen_clone.lock().push(event.message().to_string());
        Ok(())
    })
    .with_middleware(|event| {
        let message = format!("{} [receiver]", event.message());
        event.with_message(message)
    });

    let logger = logger()
        .with_receiver(receiver)
        .with_middleware(|event| {
            let message = format!("{} [first]", event.message());
            event.with_message(message)
        })
        .with_middleware(|event| {
            let message = format!("{} [second]", event.message());
            event.with_message(message)
        });

    let returned = logger.log(EventLevel::NOTE.event("msg"));
    assert_eq!(returned.message(), "msg [first] [second]");
    assert_eq!(*seen.lock(), vec!["msg [first] [second] [receiver]".to_string()]);
}

#[test]
fn test_text_file_delivery_is_one_line_per_event() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("events.log");

    let sink = FormattedSink::new("file", TextFormat::new(), file_delivery(log_file.clone()));
    let logger = logger().with_receiver(receiver(sink));

    logger.log(EventLevel::MESSAGE.event("User login\nERROR [2024-10-17] Fake error injected"));
    logger.log(EventLevel::WARNING.event("second").with_field("attempt", 2));
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\\n"));
    assert!(lines[1].contains("[WARNING ]"));
    assert!(lines[1].ends_with("attempt=2"));
}

#[test]
fn test_buffered_json_file_delivery() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("events.jsonl");

    let sink = BufferedSink::builder("jsonl", JsonFormat::new(), file_delivery(log_file.clone()))
        .flush_threshold(3)
        .build()
        .unwrap();
    let logger = logger().with_receiver(receiver(sink));

    for i in 0..4 {
        logger.log(EventLevel::NOTE.event(format!("event {}", i)).with_field("i", i));
    }

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 3);

    logger.flush().unwrap();
    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 4);
    assert_eq!(records[3]["message"], "event 3");
    assert_eq!(records[3]["fields"]["i"], 3);
}

#[test]
fn test_buffered_sink_drains_when_logger_dropped() {
    let batches = Arc::new(Mutex::new(Vec::<Vec<String>>::new()));
    let batches_clone = Arc::clone(&batches);

    {
        let sink = BufferedSink::builder(
            "on-drop",
            |event: &Event| event.message().to_string(),
            move |batch: Vec<String>| -> Result<()> {
                batches_clone.lock().push(batch);
                Ok(())
            },
        )
        .flush_threshold(100)
        .build()
        .unwrap();

        let logger = logger().with_receiver(receiver(sink));
        logger.log(EventLevel::NOTE.event("pending"));
        assert!(batches.lock().is_empty());
    }

    assert_eq!(*batches.lock(), vec![vec!["pending".to_string()]]);
}

#[test]
fn test_logger_flush_reports_first_error() {
    struct Unflushable;

    impl Sink for Unflushable {
        fn emit(&self, _event: &Event) -> Result<()> {
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Err(LoggerError::delivery("disk detached"))
        }

        fn name(&self) -> &str {
            "unflushable"
        }
    }

    let logger = logger().with_receiver(receiver(Unflushable));
    let err = logger.flush().unwrap_err();
    assert!(err.to_string().contains("disk detached"));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    assert!(logger().with_limits(50, 40).unwrap_err().is_configuration());
    assert!(logger().with_limits(100, 100).is_err());
    assert!(logger().with_limits(0, 0).is_err());
    assert!(EventLevel::custom("ZERO", 0).is_err());
    assert!(EventLevel::custom("TOP", 100).is_err());
    assert!(EventLevel::WARNING.with_default_tags(["x"]).is_err());
}
