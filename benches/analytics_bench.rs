use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use stockscope::{
    AnalyticsEngine, ChartPageComposer, ColumnHeader, PriceSeries, RawRow, RawTable,
    SeriesNormalizer,
};

/// Deterministic zig-zag series, roughly `years` of trading days
fn synthetic_series(years: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let rows = (0..years * 252)
        .map(|i| {
            let drift = i as f64 * 0.05;
            let swing = ((i % 17) as f64 - 8.0) * 0.7;
            let close = 500.0 + drift + swing;
            RawRow::new(
                start + Days::new(i as u64),
                vec![
                    close - 1.0,
                    close + 2.5,
                    close - 2.5,
                    close,
                    (100_000 + (i % 97) * 1_000) as f64,
                ],
            )
        })
        .collect();
    let header = ColumnHeader::Flat(
        ["Open", "High", "Low", "Close", "Volume"]
            .map(String::from)
            .to_vec(),
    );
    SeriesNormalizer::new()
        .normalize(&RawTable::new(header, rows))
        .unwrap()
}

fn bench_analyze(c: &mut Criterion) {
    let engine = AnalyticsEngine::new();
    let mut group = c.benchmark_group("analyze");
    for years in [1usize, 5, 20] {
        let series = synthetic_series(years);
        group.bench_with_input(BenchmarkId::from_parameter(years), &series, |b, s| {
            b.iter(|| engine.analyze(black_box(s)).unwrap())
        });
    }
    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let series = synthetic_series(5);
    let report = AnalyticsEngine::new().analyze(&series).unwrap();
    let composer = ChartPageComposer::new();
    c.bench_function("compose_5y", |b| {
        b.iter(|| composer.compose(black_box(&series), black_box(&report)))
    });
}

criterion_group!(benches, bench_analyze, bench_compose);
criterion_main!(benches);
