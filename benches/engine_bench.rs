//! Benchmarks for RangeKV engine operations

use criterion::{criterion_group, criterion_main, Criterion};
use rangekv::{Config, Engine, LogBackend};
use tempfile::TempDir;

fn engine_benchmarks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(dir.path())
        .backend(LogBackend::FramedFile)
        .build();
    let engine = Engine::open(&config).unwrap();

    for i in 0..1000 {
        engine
            .put(format!("key{i:04}"), format!("value{i}"))
            .unwrap();
    }

    c.bench_function("put_fsync", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            engine
                .put(format!("key{:04}", n % 1000), "updated".to_string())
                .unwrap();
        })
    });

    c.bench_function("get_hit", |b| {
        b.iter(|| engine.get("key0500").unwrap())
    });

    c.bench_function("scan_100", |b| {
        b.iter(|| engine.scan("key0400", "key0499").unwrap())
    });
}

criterion_group!(benches, engine_benchmarks);
criterion_main!(benches);
