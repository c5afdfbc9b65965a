//! Core data types: raw retrieval tables and the canonical daily price series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day in canonical OHLCV form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Trading date (unique within a series)
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Shares/contracts traded
    pub volume: u64,
}

impl PriceRow {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Daily price series ordered by ascending date, without duplicate dates
///
/// Only [`SeriesNormalizer`](crate::normalizer::SeriesNormalizer) builds one,
/// so every instance already satisfies the ordering invariant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    rows: Vec<PriceRow>,
}

impl PriceSeries {
    pub(crate) fn from_sorted_rows(rows: Vec<PriceRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&PriceRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&PriceRow> {
        self.rows.last()
    }

    /// The trailing `count` rows (the whole series when it is shorter)
    pub fn tail(&self, count: usize) -> &[PriceRow] {
        let start = self.rows.len().saturating_sub(count);
        &self.rows[start..]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    /// Column values in canonical order, volume widened to `f64`
    pub fn column(&self, field: OhlcvField) -> Vec<f64> {
        self.rows.iter().map(|r| field.value_of(r)).collect()
    }
}

/// The five canonical value fields, in canonical column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OhlcvField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl OhlcvField {
    pub const ALL: [OhlcvField; 5] = [
        OhlcvField::Open,
        OhlcvField::High,
        OhlcvField::Low,
        OhlcvField::Close,
        OhlcvField::Volume,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OhlcvField::Open => "Open",
            OhlcvField::High => "High",
            OhlcvField::Low => "Low",
            OhlcvField::Close => "Close",
            OhlcvField::Volume => "Volume",
        }
    }

    pub fn value_of(self, row: &PriceRow) -> f64 {
        match self {
            OhlcvField::Open => row.open,
            OhlcvField::High => row.high,
            OhlcvField::Low => row.low,
            OhlcvField::Close => row.close,
            OhlcvField::Volume => row.volume as f64,
        }
    }
}

/// Column header of a raw table as delivered by retrieval
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnHeader {
    /// One header row: one name per value column
    Flat(Vec<String>),
    /// Several header levels (e.g. field name over ticker); each inner vec is one level
    Nested(Vec<Vec<String>>),
}

impl ColumnHeader {
    /// Collapse the header to one name per value column.
    ///
    /// Nested levels are joined per column with `/`, skipping empty cells.
    /// The width of the widest level wins.
    pub fn flatten(&self) -> Vec<String> {
        match self {
            ColumnHeader::Flat(names) => names.clone(),
            ColumnHeader::Nested(levels) => {
                let width = levels.iter().map(Vec::len).max().unwrap_or(0);
                (0..width)
                    .map(|col| {
                        levels
                            .iter()
                            .filter_map(|level| level.get(col))
                            .map(|cell| cell.trim())
                            .filter(|cell| !cell.is_empty())
                            .collect::<Vec<_>>()
                            .join("/")
                    })
                    .collect()
            }
        }
    }
}

/// One raw row: a date and its value cells in retrieval order
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

impl RawRow {
    pub fn new(date: NaiveDate, values: Vec<f64>) -> Self {
        Self { date, values }
    }
}

/// Table handed over by the retrieval collaborator, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub header: ColumnHeader,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(header: ColumnHeader, rows: Vec<RawRow>) -> Self {
        Self { header, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_nested_header_flatten() {
        let header = ColumnHeader::Nested(vec![
            vec!["Open".into(), "High".into(), "Low".into(), "Close".into(), "Volume".into()],
            vec!["AAPL".into(), "AAPL".into(), "AAPL".into(), "AAPL".into(), "".into()],
        ]);
        assert_eq!(
            header.flatten(),
            vec!["Open/AAPL", "High/AAPL", "Low/AAPL", "Close/AAPL", "Volume"]
        );
    }

    #[test]
    fn test_tail_shorter_than_count() {
        let rows = (1..=3)
            .map(|d| PriceRow::new(day(d), 1.0, 1.0, 1.0, 1.0, 10))
            .collect();
        let series = PriceSeries::from_sorted_rows(rows);
        assert_eq!(series.tail(30).len(), 3);
        assert_eq!(series.tail(2)[0].date, day(2));
    }

    #[test]
    fn test_volume_column_widened() {
        let series =
            PriceSeries::from_sorted_rows(vec![PriceRow::new(day(1), 1.0, 2.0, 0.5, 1.5, 42)]);
        assert_eq!(series.column(OhlcvField::Volume), vec![42.0]);
        assert_eq!(series.column(OhlcvField::High), vec![2.0]);
    }
}
