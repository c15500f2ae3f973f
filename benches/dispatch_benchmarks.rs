//! Criterion benchmarks for rust_event_dispatch

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_event_dispatch::core::silent_handler;
use rust_event_dispatch::dispatch::{BufferedSink, TextFormat, ThreadExecutor};
use rust_event_dispatch::prelude::*;
use std::sync::Arc;

fn null_receiver(name: &str) -> Receiver {
    Receiver::from_fn(name, |event| {
        black_box(event.message());
        Ok(())
    })
}

// ============================================================================
// Event Construction Benchmarks
// ============================================================================

fn bench_event_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("plain", |b| {
        b.iter(|| black_box(EventLevel::MESSAGE.event("request handled")));
    });

    group.bench_function("with_fields", |b| {
        b.iter(|| {
            black_box(
                EventLevel::MESSAGE
                    .event("request handled")
                    .with_field("status", 200)
                    .with_field("path", "/api/users")
                    .with_tag("http"),
            )
        });
    });

    group.finish();
}

// ============================================================================
// Fan-out Benchmarks
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    group.throughput(Throughput::Elements(1));

    for receivers in [1usize, 4, 16] {
        let logger = logger().with_receivers(
            (0..receivers).map(|i| null_receiver(&format!("r{}", i))),
            true,
        );
        group.bench_function(format!("{}_receivers", receivers), |b| {
            b.iter(|| black_box(logger.log(EventLevel::MESSAGE.event("fan out"))));
        });
    }

    let tagged = logger()
        .with_receiver(null_receiver("r"))
        .with_tags(["api", "v2"])
        .unwrap()
        .with_middleware(|event| event.with_tag("enriched"));
    group.bench_function("tags_and_middleware", |b| {
        b.iter(|| black_box(tagged.log(EventLevel::MESSAGE.event("enriched"))));
    });

    group.finish();
}

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = logger()
        .with_receiver(null_receiver("r"))
        .with_limits(60, 100)
        .unwrap();

    group.bench_function("filtered_out", |b| {
        b.iter(|| black_box(logger.log(EventLevel::DEBUG.event("dropped"))));
    });

    group.bench_function("passed", |b| {
        b.iter(|| black_box(logger.log(EventLevel::ERROR.event("kept"))));
    });

    group.finish();
}

// ============================================================================
// Buffered Delivery Benchmarks
// ============================================================================

fn bench_buffered(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered");
    group.throughput(Throughput::Elements(1));

    let sync_sink = BufferedSink::builder("sync", TextFormat::new(), |batch: Vec<String>| -> Result<()> {
        black_box(batch);
        Ok(())
    })
    .flush_threshold(64)
    .diagnostics(silent_handler())
    .build()
    .unwrap();
    let sync_logger = logger().with_receiver(receiver(sync_sink));

    group.bench_function("sync_text", |b| {
        b.iter(|| black_box(sync_logger.log(EventLevel::MESSAGE.event("buffered"))));
    });

    let async_sink = BufferedSink::builder("async", TextFormat::new(), |batch: Vec<String>| -> Result<()> {
        black_box(batch);
        Ok(())
    })
    .flush_threshold(256)
    .executor(Arc::new(ThreadExecutor::new()))
    .diagnostics(silent_handler())
    .build()
    .unwrap();
    let async_logger = logger().with_receiver(receiver(async_sink));

    group.bench_function("async_text", |b| {
        b.iter(|| black_box(async_logger.log(EventLevel::MESSAGE.event("buffered"))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_event_creation,
    bench_fan_out,
    bench_level_filtering,
    bench_buffered,
);

criterion_main!(benches);
