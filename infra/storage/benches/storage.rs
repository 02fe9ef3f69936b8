use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kw_storage::{Compression, Storage};
use std::hint::black_box;
use tempfile::TempDir;

fn open(rt: &tokio::runtime::Runtime, temp: &TempDir, compression: Compression) -> Storage {
    rt.block_on(Storage::builder().root(temp.path()).compression(compression).connect())
        .expect("storage")
}

fn bench_resolve(c: &mut Criterion) {
    let temp = TempDir::new().expect("tempdir");
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let storage = open(&rt, &temp, Compression::None);
    let attachments = storage.namespace("attachments").expect("namespace");

    let mut group = c.benchmark_group("resolve");
    group.bench_function("snapshot", |b| {
        b.iter(|| black_box(storage.resolve("inventory.snapshot").expect("resolve")));
    });
    group.bench_function("attachment", |b| {
        b.iter(|| black_box(attachments.resolve("9c2e41d7.bin").expect("resolve")));
    });
    group.finish();
}

fn bench_snapshot_write(c: &mut Criterion) {
    let temp = TempDir::new().expect("tempdir");
    let rt = tokio::runtime::Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("snapshot_write");
    group.sample_size(20);
    for (label, compression) in [("plain", Compression::None), ("lz4", Compression::Lz4)] {
        let storage = open(&rt, &temp, compression);
        for size in [64 * 1024usize, 1024 * 1024] {
            let payload: Vec<u8> = (0..size).map(|i| (i % 61) as u8).collect();
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(label, size), &payload, |b, payload| {
                b.to_async(&rt).iter(|| async {
                    storage.write("inventory.snapshot", payload).await.expect("write");
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_snapshot_write);
criterion_main!(benches);
