//! End-to-end checks: CSV files through normalization, analytics and composition

use chrono::{Days, NaiveDate};
use std::fs;
use std::io::{self, Cursor};
use stockscope::{
    AnalyticsEngine, AnalyticsReport, ChartPage, ChartPageComposer, ChartSink, CsvSeriesSource,
    PanelContent, Period, PriceSeries, SeriesNormalizer, SeriesSource, Session,
};
use tempfile::TempDir;

/// Deterministic pseudo-random walk (LCG), one line per trading day
fn walk(days: usize, seed: u64) -> Vec<(NaiveDate, [f64; 5])> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let mut state = seed;
    let mut close = 250.0;
    (0..days)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let step = ((state >> 33) % 1000) as f64 / 100.0 - 5.0;
            let open = close;
            close = (close + step).max(1.0);
            let high = open.max(close) + 1.25;
            let low = open.min(close) - 1.25;
            let volume = 10_000.0 + ((state >> 40) % 5_000) as f64;
            (start + Days::new(i as u64), [open, high, low, close, volume])
        })
        .collect()
}

fn write_flat(path: &std::path::Path, days: &[(NaiveDate, [f64; 5])]) {
    let mut text = String::from("Date,Open,High,Low,Close,Volume\n");
    for (date, [o, h, l, c, v]) in days {
        text.push_str(&format!("{},{},{},{},{},{}\n", date, o, h, l, c, v));
    }
    fs::write(path, text).unwrap();
}

fn write_nested_with_adj_close(path: &std::path::Path, days: &[(NaiveDate, [f64; 5])]) {
    let mut text = String::from(
        "Price,Open,High,Low,Close,Volume,Adj Close\n\
         Ticker,NEST,NEST,NEST,NEST,NEST,NEST\n\
         Date,,,,,,\n",
    );
    for (date, [o, h, l, c, v]) in days {
        text.push_str(&format!(
            "{} 00:00:00+05:30,{},{},{},{},{},{}\n",
            date,
            o,
            h,
            l,
            c,
            v,
            c * 0.97
        ));
    }
    fs::write(path, text).unwrap();
}

fn load(source: &CsvSeriesSource, symbol: &str, period: Period) -> (PriceSeries, AnalyticsReport) {
    let table = source.fetch(symbol, period).unwrap();
    let series = SeriesNormalizer::new().normalize(&table).unwrap();
    let report = AnalyticsEngine::new().analyze(&series).unwrap();
    (series, report)
}

#[test]
fn adjusted_close_layout_yields_identical_report() {
    let dir = TempDir::new().unwrap();
    let days = walk(120, 7);
    write_flat(&dir.path().join("FLAT.csv"), &days);
    write_nested_with_adj_close(&dir.path().join("NEST.csv"), &days);

    let source = CsvSeriesSource::new(dir.path());
    let (flat_series, flat) = load(&source, "FLAT", Period::Max);
    let (nested_series, nested) = load(&source, "NEST", Period::Max);

    assert_eq!(flat_series, nested_series);
    assert_eq!(flat, nested);
}

#[test]
fn report_properties_hold_on_random_walk() {
    let dir = TempDir::new().unwrap();
    write_flat(&dir.path().join("WALK.csv"), &walk(300, 42));
    let (series, report) = load(&CsvSeriesSource::new(dir.path()), "WALK", Period::Max);

    let expected = (report.end_price - report.start_price) / report.start_price * 100.0;
    assert!((report.total_return_pct - expected).abs() < 1e-9);

    let ma20 = report.ma20.as_ref().unwrap();
    assert_eq!(ma20.len(), series.len());
    assert_eq!(ma20.first_defined(), Some(19));
    let closes = series.closes();
    let manual: f64 = closes[100..120].iter().sum::<f64>() / 20.0;
    assert!((ma20.get(119).unwrap() - manual).abs() < 1e-9);

    let matrix = &report.correlation_matrix;
    for i in 0..5 {
        assert_eq!(matrix.get(i, i), Some(1.0));
        for j in 0..5 {
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
        }
    }

    assert!(report.support <= report.resistance);
    assert!(report.support >= report.low_min);
    assert!(report.resistance <= report.high_max);
}

#[test]
fn period_filter_shortens_the_series() {
    let dir = TempDir::new().unwrap();
    write_flat(&dir.path().join("LONG.csv"), &walk(800, 3));
    let source = CsvSeriesSource::new(dir.path());

    let (all, _) = load(&source, "LONG", Period::Max);
    let (year, report) = load(&source, "LONG", Period::OneYear);
    let (week, _) = load(&source, "LONG", Period::OneWeek);

    assert_eq!(all.len(), 800);
    assert!(year.len() < all.len());
    assert_eq!(week.len(), 7);
    assert_eq!(year.last(), all.last());
    assert_eq!(
        report.start_date,
        Period::OneYear.start_from(report.end_date).unwrap() + Days::new(1)
    );
}

#[test]
fn short_series_composes_with_degraded_panels() {
    let dir = TempDir::new().unwrap();
    write_flat(&dir.path().join("SHORT.csv"), &walk(15, 9));
    let (series, report) = load(&CsvSeriesSource::new(dir.path()), "SHORT", Period::Max);

    let pages = ChartPageComposer::new().compose(&series, &report);
    assert_eq!(pages.len(), 4);
    assert!(pages[2].panels[0].is_blank());
    match &pages[0].panels[1].content {
        PanelContent::MovingAverages { ma20, ma50, close } => {
            assert!(ma20.is_none());
            assert!(ma50.is_none());
            assert_eq!(close.len(), 15);
        }
        other => panic!("unexpected content {:?}", other),
    }
}

#[derive(Default)]
struct CollectingSink {
    pages: Vec<ChartPage>,
}

impl ChartSink for CollectingSink {
    type Error = io::Error;

    fn render_page(&mut self, _symbol: &str, page: &ChartPage) -> Result<(), io::Error> {
        self.pages.push(page.clone());
        Ok(())
    }
}

#[test]
fn interactive_session_over_csv_directory() {
    let dir = TempDir::new().unwrap();
    write_flat(&dir.path().join("INFY.NS.csv"), &walk(90, 11));
    write_flat(&dir.path().join("TCS.NS.csv"), &walk(40, 12));

    let mut session = Session::new(CsvSeriesSource::new(dir.path()), CollectingSink::default());
    let mut input = Cursor::new(b"infy.ns\n3m\ny\nMISSING\n1y\ntcs.ns\nmax\nn\n".to_vec());
    let mut output = Vec::new();
    session.run(&mut input, &mut output).unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("INFY.NS COMPLETE ANALYSIS (3M)"));
    assert!(text.contains("No data found!"));
    assert!(text.contains("TCS.NS COMPLETE ANALYSIS (MAX)"));

    let sink = session.into_sink();
    assert_eq!(sink.pages.len(), 8);
    assert_eq!(
        sink.pages.iter().map(|p| p.number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 1, 2, 3, 4]
    );
}
