use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fsreport_core::audit::AuditRecorder;
use fsreport_core::pipeline::{IngestContext, IngestionEngine};
use fsreport_core::storage::MemoryStore;

fn make_body(host: &str, dirs: usize, bytes_per_dir: u64) -> Vec<u8> {
    let directories: Vec<serde_json::Value> = (0..dirs)
        .map(|i| {
            serde_json::json!({
                "path": format!("/srv/share/dir-{i:05}"),
                "file_count": 17,
                "size_bytes": bytes_per_dir,
                "size_mb": bytes_per_dir / 1_048_576,
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "host_ip": host,
        "host_name": "bench-host",
        "base_path": "/srv/share",
        "total_directories": dirs,
        "timestamp": "2026-01-29 10:00:00",
        "directories": directories,
    }))
    .unwrap_or_default()
}

fn engine() -> IngestionEngine {
    let store = Arc::new(MemoryStore::new());
    IngestionEngine::new(store.clone(), AuditRecorder::without_text_log(store))
}

// Every submission after the first is a duplicate: lookup, decode, compare.
fn bench_skip_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest/skip");

    for dirs in [10usize, 100, 1_000] {
        let body = make_body("10.0.0.5", dirs, 4_096);
        let engine = engine();
        let _ = engine.ingest_raw(&body, &IngestContext::new());

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dirs), &body, |b, body| {
            b.iter(|| black_box(engine.ingest_raw(black_box(body), &IngestContext::new())))
        });
    }

    group.finish();
}

// Alternate between two sizes so every submission is stored.
fn bench_store_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest/store");

    for dirs in [10usize, 100] {
        let bodies = [make_body("10.0.0.6", dirs, 4_096), make_body("10.0.0.6", dirs, 8_192)];
        let engine = engine();
        let mut toggle = 0usize;

        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::from_parameter(dirs), |b| {
            b.iter(|| {
                toggle ^= 1;
                black_box(engine.ingest_raw(&bodies[toggle], &IngestContext::new()))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_skip_path, bench_store_path);
criterion_main!(benches);
