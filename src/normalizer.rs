//! Schema normalization from retrieval tables into canonical price series
//!
//! Retrieval hands over either five value columns (open, high, low, close,
//! volume) or six (the same plus an adjusted close). The layout is resolved
//! once from the flattened header width and then applied positionally to
//! every row; the adjusted close is dropped.

use crate::errors::{AnalysisError, Result};
use crate::types::{PriceRow, PriceSeries, RawRow, RawTable};
use tracing::{debug, warn};

/// Value-column layouts the normalizer accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// open, high, low, close, volume
    Ohlcv,
    /// open, high, low, close, volume, adjusted close
    OhlcvAdjClose,
}

impl ColumnLayout {
    /// Resolve the layout from the number of value columns
    pub fn from_width(width: usize) -> Result<Self> {
        match width {
            5 => Ok(ColumnLayout::Ohlcv),
            6 => Ok(ColumnLayout::OhlcvAdjClose),
            other => Err(AnalysisError::MalformedColumns {
                message: format!("expected 5 or 6 value columns, found {}", other),
            }),
        }
    }

    pub fn width(self) -> usize {
        match self {
            ColumnLayout::Ohlcv => 5,
            ColumnLayout::OhlcvAdjClose => 6,
        }
    }
}

/// Converts raw retrieval tables into [`PriceSeries`]
#[derive(Debug, Default, Clone)]
pub struct SeriesNormalizer;

impl SeriesNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Validate and canonicalize a raw table.
    ///
    /// Fails with `EmptySeries` before looking at columns, so callers can tell
    /// "no data in period" apart from format problems.
    pub fn normalize(&self, table: &RawTable) -> Result<PriceSeries> {
        if table.rows.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }

        let columns = table.header.flatten();
        let layout = ColumnLayout::from_width(columns.len())?;
        debug!(?layout, ?columns, rows = table.rows.len(), "resolved column layout");

        let mut rows = table
            .rows
            .iter()
            .map(|raw| self.canonical_row(raw, layout))
            .collect::<Result<Vec<_>>>()?;

        if rows.windows(2).any(|pair| pair[0].date > pair[1].date) {
            warn!("raw rows arrived out of date order, sorting");
            rows.sort_by_key(|row| row.date);
        }

        if let Some(pair) = rows.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(AnalysisError::DuplicateDate { date: pair[0].date });
        }

        Ok(PriceSeries::from_sorted_rows(rows))
    }

    fn canonical_row(&self, raw: &RawRow, layout: ColumnLayout) -> Result<PriceRow> {
        if raw.values.len() != layout.width() {
            return Err(AnalysisError::MalformedColumns {
                message: format!(
                    "row {} has {} value columns, header declares {}",
                    raw.date,
                    raw.values.len(),
                    layout.width()
                ),
            });
        }

        let price = |index: usize, name: &str| -> Result<f64> {
            let value = raw.values[index];
            if value.is_finite() {
                Ok(value)
            } else {
                Err(AnalysisError::InvalidValue {
                    message: format!("{} on {} is not a finite number", name, raw.date),
                })
            }
        };

        Ok(PriceRow {
            date: raw.date,
            open: price(0, "open")?,
            high: price(1, "high")?,
            low: price(2, "low")?,
            close: price(3, "close")?,
            volume: volume_count(raw.values[4], raw)?,
        })
    }
}

fn volume_count(value: f64, raw: &RawRow) -> Result<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(AnalysisError::InvalidValue {
            message: format!(
                "volume on {} must be a non-negative whole number, got {}",
                raw.date, value
            ),
        });
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnHeader;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn flat(names: &[&str]) -> ColumnHeader {
        ColumnHeader::Flat(names.iter().map(|s| s.to_string()).collect())
    }

    fn five_columns() -> ColumnHeader {
        flat(&["Open", "High", "Low", "Close", "Volume"])
    }

    #[test]
    fn test_five_column_layout_preserved() {
        let table = RawTable::new(
            five_columns(),
            vec![RawRow::new(day(1), vec![10.0, 12.0, 9.0, 11.0, 1500.0])],
        );
        let series = SeriesNormalizer::new().normalize(&table).unwrap();
        assert_eq!(
            series.rows()[0],
            PriceRow::new(day(1), 10.0, 12.0, 9.0, 11.0, 1500)
        );
    }

    #[test]
    fn test_adjusted_close_dropped() {
        let table = RawTable::new(
            flat(&["Open", "High", "Low", "Close", "Volume", "Adj Close"]),
            vec![RawRow::new(day(1), vec![10.0, 12.0, 9.0, 11.0, 1500.0, 10.7])],
        );
        let series = SeriesNormalizer::new().normalize(&table).unwrap();
        assert_eq!(series.rows()[0].close, 11.0);
        assert_eq!(series.rows()[0].volume, 1500);
    }

    #[test]
    fn test_nested_header_resolved_by_position() {
        let header = ColumnHeader::Nested(vec![
            vec!["Price".into(); 6],
            vec!["RELIANCE.NS".into(); 6],
        ]);
        let table = RawTable::new(
            header,
            vec![RawRow::new(day(4), vec![1.0, 2.0, 0.5, 1.5, 7.0, 1.4])],
        );
        let series = SeriesNormalizer::new().normalize(&table).unwrap();
        assert_eq!(series.rows()[0].high, 2.0);
        assert_eq!(series.rows()[0].volume, 7);
    }

    #[test]
    fn test_empty_table_is_empty_series() {
        let table = RawTable::new(flat(&["a", "b"]), Vec::new());
        let err = SeriesNormalizer::new().normalize(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptySeries));
    }

    #[test]
    fn test_unrecognized_width_rejected() {
        let table = RawTable::new(
            flat(&["Open", "High", "Low", "Close"]),
            vec![RawRow::new(day(1), vec![1.0, 1.0, 1.0, 1.0])],
        );
        let err = SeriesNormalizer::new().normalize(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedColumns { .. }));
    }

    #[test]
    fn test_row_width_mismatch_rejected() {
        let table = RawTable::new(
            five_columns(),
            vec![RawRow::new(day(1), vec![1.0, 1.0, 1.0, 1.0, 5.0, 1.0])],
        );
        let err = SeriesNormalizer::new().normalize(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedColumns { .. }));
    }

    #[test]
    fn test_out_of_order_rows_sorted() {
        let table = RawTable::new(
            five_columns(),
            vec![
                RawRow::new(day(3), vec![3.0, 3.0, 3.0, 3.0, 3.0]),
                RawRow::new(day(1), vec![1.0, 1.0, 1.0, 1.0, 1.0]),
                RawRow::new(day(2), vec![2.0, 2.0, 2.0, 2.0, 2.0]),
            ],
        );
        let series = SeriesNormalizer::new().normalize(&table).unwrap();
        assert_eq!(series.dates(), vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let table = RawTable::new(
            five_columns(),
            vec![
                RawRow::new(day(1), vec![1.0, 1.0, 1.0, 1.0, 1.0]),
                RawRow::new(day(1), vec![2.0, 2.0, 2.0, 2.0, 2.0]),
            ],
        );
        let err = SeriesNormalizer::new().normalize(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateDate { date } if date == day(1)));
    }

    #[test]
    fn test_fractional_or_negative_volume_rejected() {
        for volume in [-5.0, 10.5, f64::NAN] {
            let table = RawTable::new(
                five_columns(),
                vec![RawRow::new(day(1), vec![1.0, 1.0, 1.0, 1.0, volume])],
            );
            let err = SeriesNormalizer::new().normalize(&table).unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidValue { .. }));
        }
    }

    #[test]
    fn test_non_finite_price_rejected() {
        let table = RawTable::new(
            five_columns(),
            vec![RawRow::new(day(1), vec![1.0, f64::INFINITY, 1.0, 1.0, 1.0])],
        );
        let err = SeriesNormalizer::new().normalize(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidValue { .. }));
    }
}
