use criterion::{criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use rand_distr::Zipf;
use std::hint::black_box;
use std::time::Duration;

use heavytop::{Config, HeavyKeeper};

fn benchmark_topk_add(c: &mut Criterion, num_adds: usize) {
    let mut rng = rand::rng();
    let zipf = Zipf::new(100_000.0, 1.03).unwrap();
    let topk = HeavyKeeper::new(Config::new(10, 1024, 2, 0.95)).unwrap();

    let data: Vec<String> = (0..num_adds)
        .map(|_| (zipf.sample(&mut rng) as u64).to_string())
        .collect();

    let mut group = c.benchmark_group(format!("TopK_Add_{}", num_adds));
    group.sample_size(60);
    group.measurement_time(Duration::from_secs(10));

    // one engine per size: keys seen in earlier iterations stay in the sketch
    group.bench_function("Add", |b| {
        b.iter(|| {
            for key in data.iter() {
                black_box(topk.add(black_box(key), 1));
            }
        });
    });
    group.finish();
}

criterion_group!(benches,
    benchmark_topk_add_1,
    benchmark_topk_add_100,
    benchmark_topk_add_10_000,
    benchmark_topk_add_1_000_000
);
criterion_main!(benches);

fn benchmark_topk_add_1(c: &mut Criterion) {
    benchmark_topk_add(c, 1);
}

fn benchmark_topk_add_100(c: &mut Criterion) {
    benchmark_topk_add(c, 100);
}

fn benchmark_topk_add_10_000(c: &mut Criterion) {
    benchmark_topk_add(c, 10_000);
}

fn benchmark_topk_add_1_000_000(c: &mut Criterion) {
    benchmark_topk_add(c, 1_000_000);
}
