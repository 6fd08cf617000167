//! Benchmarks for the simulator loop and the metrics pass.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spark_backtest::{BacktestReport, MetricsConfig, Simulator, SimulatorConfig};
use spark_core::types::{Bar, BarSeries, Timeframe};
use spark_strategies::StrategyRegistry;

fn generate_series(size: usize) -> BarSeries {
    let bars = (0..size)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar::new(i as i64 * 60_000, close, close + 0.5, close - 0.5, close, 1_000.0).unwrap()
        })
        .collect();
    BarSeries::new("BENCH", Timeframe::Minute1, bars).unwrap()
}

fn benchmark_simulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simulator");
    let registry = StrategyRegistry::new();
    let sim = Simulator::new(SimulatorConfig::default()).unwrap();

    for size in [1_000, 10_000, 100_000].iter() {
        let series = generate_series(*size);

        for name in ["sma_cross", "breakout"] {
            group.bench_with_input(BenchmarkId::new(name, size), &series, |b, series| {
                let mut strategy = registry.create_default(name).unwrap();
                b.iter(|| sim.run(black_box(series), strategy.as_mut()).unwrap())
            });
        }
    }

    group.finish();
}

fn benchmark_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("Metrics");
    let sim = Simulator::new(SimulatorConfig::default()).unwrap();
    let mut strategy = StrategyRegistry::new().create_default("sma_cross").unwrap();

    for size in [10_000, 100_000].iter() {
        let result = sim.run(&generate_series(*size), strategy.as_mut()).unwrap();

        group.bench_with_input(BenchmarkId::new("summary", size), &result, |b, result| {
            b.iter(|| BacktestReport::new(black_box(result).clone(), &MetricsConfig::default()))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_simulator, benchmark_metrics);
criterion_main!(benches);
