//! Benchmarks for indicator implementations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spark_core::traits::{Indicator, StreamingIndicator};
use spark_indicators::{PriceChannel, RollingSma, Sma};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMA");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("batch", size), &data, |b, data| {
            let sma = Sma::new(20).unwrap();
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("rolling", size), &data, |b, data| {
            b.iter(|| {
                let mut sma = RollingSma::new(20).unwrap();
                let mut last = None;
                for &value in black_box(data) {
                    last = sma.update(value);
                }
                last
            })
        });
    }

    group.finish();
}

fn benchmark_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("PriceChannel");

    for size in [1000, 10000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("rolling", size), &data, |b, data| {
            b.iter(|| {
                let mut channel = PriceChannel::new(20).unwrap();
                let mut last = None;
                for &value in black_box(data) {
                    last = channel.update((value + 1.0, value - 1.0));
                }
                last
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sma, benchmark_channel);
criterion_main!(benches);
