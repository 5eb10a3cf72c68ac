use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use zpack::codec::{FnSink, Reader, ReaderConfig, Tree, TreeConfig, Writer};
use zpack_error::CodecError;

/// Массив из `n` записей вида `{"id": u64, "name": str, "score": double,
/// "tags": [str, str]}`.
fn records(n: usize) -> Vec<u8> {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut writer = Writer::growable();
    writer.start_array(n as u32);
    for i in 0..n {
        writer.start_map(4);
        writer.write_str("id");
        writer.write_uint(rng.gen::<u32>() as u64);
        writer.write_str("name");
        writer.write_str(&format!("record-{i}"));
        writer.write_str("score");
        writer.write_double(rng.gen::<f64>());
        writer.write_str("tags");
        writer.start_array(2);
        writer.write_str("alpha");
        writer.write_str("beta");
        writer.finish_array();
        writer.finish_map();
    }
    writer.finish_array();
    writer.into_vec().unwrap()
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    for &capacity in &[16usize, 4096] {
        group.bench_with_input(
            BenchmarkId::new("records_1000_buffer", capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let mut total = 0usize;
                    let mut buffer = vec![0u8; capacity];
                    let mut writer = Writer::with_buffer(
                        &mut buffer,
                        FnSink::new(|data: &[u8]| -> Result<(), CodecError> {
                            total += data.len();
                            Ok(())
                        }),
                    );
                    writer.start_array(1000);
                    for i in 0..1000u64 {
                        writer.start_map(2);
                        writer.write_str("id");
                        writer.write_uint(black_box(i));
                        writer.write_str("name");
                        writer.write_str("record");
                        writer.finish_map();
                    }
                    writer.finish_array();
                    writer.destroy().unwrap();
                    black_box(total);
                })
            },
        );
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let data = records(1000);
    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("discard", |b| {
        b.iter(|| {
            let mut reader = Reader::new(black_box(&data));
            reader.discard();
            reader.destroy().unwrap();
        })
    });

    group.bench_function("expect", |b| {
        let keys = ["id", "name", "score", "tags"];
        b.iter(|| {
            let mut reader = Reader::with_config(black_box(&data), ReaderConfig::default());
            let mut sum = 0u64;
            let count = reader.expect_array();
            for _ in 0..count {
                let mut found = [false; 4];
                let pairs = reader.expect_map();
                for _ in 0..pairs {
                    match reader.expect_key(&keys, &mut found) {
                        0 => sum += reader.expect_u64(),
                        _ => reader.discard(),
                    }
                }
                reader.done_map();
            }
            reader.done_array();
            reader.destroy().unwrap();
            black_box(sum);
        })
    });

    group.bench_function("tree", |b| {
        b.iter(|| {
            let tree = Tree::from_bytes(black_box(&data), TreeConfig::default());
            let root = tree.root();
            let mut sum = 0u64;
            for i in 0..root.array_len() as usize {
                sum += root.array_at(i).map_str("id").as_u64();
            }
            tree.destroy().unwrap();
            black_box(sum);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_write, bench_read);
criterion_main!(benches);
