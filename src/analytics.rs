//! Analytics engine: derived series and scalars for a daily price series
//!
//! Everything here is a pure function of the [`PriceSeries`]. Metrics that
//! need more history than the series has are reported as absent
//! (`Option::None`) rather than as errors; only the load-bearing total
//! return fails the whole report.

use crate::errors::{AnalysisError, Result};
use crate::statistics;
use crate::types::{OhlcvField, PriceSeries};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Short moving-average window (rows)
pub const MA_SHORT_WINDOW: usize = 20;
/// Long moving-average window (rows)
pub const MA_LONG_WINDOW: usize = 50;
/// Rolling volatility window (daily returns)
pub const VOLATILITY_WINDOW: usize = 20;
/// Trailing rows used for support and resistance
pub const SUPPORT_RESISTANCE_WINDOW: usize = 30;

/// Sequence of optional values aligned position-by-position to another sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    values: Vec<Option<f64>>,
}

impl AlignedSeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Index of the first defined value
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    /// `(position, value)` pairs of the defined values only
    pub fn defined(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }
}

/// Symmetric 5x5 Pearson matrix over open, high, low, close, volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    cells: [[Option<f64>; 5]; 5],
}

impl CorrelationMatrix {
    pub const FIELDS: [OhlcvField; 5] = OhlcvField::ALL;

    fn compute(series: &PriceSeries) -> Self {
        let columns: Vec<Vec<f64>> = Self::FIELDS.iter().map(|f| series.column(*f)).collect();
        let mut cells = [[None; 5]; 5];

        for i in 0..5 {
            cells[i][i] = Some(1.0);
            for j in (i + 1)..5 {
                let r = statistics::pearson(&columns[i], &columns[j]);
                cells[i][j] = r;
                cells[j][i] = r;
            }
        }

        Self { cells }
    }

    /// Coefficient between two fields; `None` when undefined
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn coefficient(&self, a: OhlcvField, b: OhlcvField) -> Option<f64> {
        let index = |f: OhlcvField| Self::FIELDS.iter().position(|x| *x == f);
        match (index(a), index(b)) {
            (Some(i), Some(j)) => self.get(i, j),
            _ => None,
        }
    }

    pub fn rows(&self) -> &[[Option<f64>; 5]; 5] {
        &self.cells
    }
}

/// Structured result of one analysis pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trading_days: usize,

    pub start_price: f64,
    pub end_price: f64,
    pub total_return_pct: f64,
    /// Sample std-dev of daily returns in percent; absent with fewer than two returns
    pub volatility_pct: Option<f64>,
    pub high_max: f64,
    pub low_min: f64,

    /// Aligned to series dates; absent unless the series is longer than 20 rows
    pub ma20: Option<AlignedSeries>,
    /// Aligned to series dates; absent unless the series is longer than 50 rows
    pub ma50: Option<AlignedSeries>,

    /// Percent change close-to-close; position `i` belongs to date `i + 1`
    pub daily_returns: Vec<f64>,
    /// Aligned to `daily_returns`; absent unless the series is longer than 20 rows
    pub rolling_volatility_20: Option<AlignedSeries>,

    pub support: f64,
    pub resistance: f64,
    pub correlation_matrix: CorrelationMatrix,
}

impl AnalyticsReport {
    /// Last close, the "current price" reference level
    pub fn current_price(&self) -> f64 {
        self.end_price
    }
}

/// Computes [`AnalyticsReport`]s
#[derive(Debug, Default, Clone)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Analyze a normalized series.
    ///
    /// Fails with `InsufficientData` on an empty series and with
    /// `DivisionByZero` when the start price or any previous close is zero.
    pub fn analyze(&self, series: &PriceSeries) -> Result<AnalyticsReport> {
        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(AnalysisError::InsufficientData {
                    metric: "total return",
                    required: 1,
                    actual: 0,
                });
            }
        };

        let closes = series.closes();
        let total_return_pct = percent_change(first.close, last.close, "total return")?;
        let daily_returns = daily_returns(series)?;
        let volatility_pct = statistics::sample_std_dev(&daily_returns);

        let highs = series.column(OhlcvField::High);
        let lows = series.column(OhlcvField::Low);
        let high_max = statistics::max(&highs).unwrap_or(last.high);
        let low_min = statistics::min(&lows).unwrap_or(last.low);

        let ma20 = moving_average(&closes, MA_SHORT_WINDOW);
        let ma50 = moving_average(&closes, MA_LONG_WINDOW);
        let rolling_volatility_20 = rolling_volatility(series.len(), &daily_returns);

        let recent = series.tail(SUPPORT_RESISTANCE_WINDOW);
        let support = recent.iter().map(|r| r.low).fold(f64::INFINITY, f64::min);
        let resistance = recent.iter().map(|r| r.high).fold(f64::NEG_INFINITY, f64::max);

        debug!(
            rows = series.len(),
            ma20 = ma20.is_some(),
            ma50 = ma50.is_some(),
            rolling_volatility = rolling_volatility_20.is_some(),
            "analytics computed"
        );

        Ok(AnalyticsReport {
            start_date: first.date,
            end_date: last.date,
            trading_days: series.len(),
            start_price: first.close,
            end_price: last.close,
            total_return_pct,
            volatility_pct,
            high_max,
            low_min,
            ma20,
            ma50,
            daily_returns,
            rolling_volatility_20,
            support,
            resistance,
            correlation_matrix: CorrelationMatrix::compute(series),
        })
    }
}

fn percent_change(from: f64, to: f64, context: &str) -> Result<f64> {
    if from == 0.0 {
        return Err(AnalysisError::DivisionByZero {
            context: context.to_string(),
        });
    }
    Ok((to - from) / from * 100.0)
}

/// Simple close-to-close percent returns
fn daily_returns(series: &PriceSeries) -> Result<Vec<f64>> {
    series
        .rows()
        .windows(2)
        .map(|pair| {
            percent_change(
                pair[0].close,
                pair[1].close,
                &format!("daily return on {}", pair[1].date),
            )
        })
        .collect()
}

/// Trailing simple moving average, omitted entirely unless `closes.len() > window`
fn moving_average(closes: &[f64], window: usize) -> Option<AlignedSeries> {
    if closes.len() <= window {
        return None;
    }
    Some(AlignedSeries::new(statistics::rolling(
        closes,
        window,
        statistics::mean,
    )))
}

/// Rolling std-dev of daily returns, omitted entirely unless the series is longer than the window
fn rolling_volatility(series_len: usize, returns: &[f64]) -> Option<AlignedSeries> {
    if series_len <= VOLATILITY_WINDOW {
        return None;
    }
    let rolled = statistics::rolling(returns, VOLATILITY_WINDOW, statistics::sample_std_dev);
    Some(AlignedSeries::new(rolled))
}
