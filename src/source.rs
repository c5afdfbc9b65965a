//! Retrieval collaborators: where raw tables come from
//!
//! The core only sees [`RawTable`]s. [`CsvSeriesSource`] serves them from a
//! directory of per-symbol CSV files, which keeps the analyzer usable offline
//! and in tests.

use crate::errors::{AnalysisError, Result};
use crate::period::Period;
use crate::types::{ColumnHeader, RawRow, RawTable};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Turns an instrument identifier and a lookback period into a raw table
pub trait SeriesSource {
    fn fetch(&self, symbol: &str, period: Period) -> Result<RawTable>;
}

/// Reads `<data_dir>/<SYMBOL>.csv`
///
/// Expected layout: zero or more header rows followed by data rows of the
/// form `date,open,high,low,close,volume[,adj close]`. Any leading row whose
/// first cell is not a date counts as a header level; two or more levels make
/// a nested header. The period is applied relative to the newest row in the
/// file.
#[derive(Debug, Clone)]
pub struct CsvSeriesSource {
    data_dir: PathBuf,
}

impl CsvSeriesSource {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, symbol: &str) -> Option<PathBuf> {
        let unsafe_name = symbol.is_empty()
            || symbol.contains(['/', '\\'])
            || symbol.contains("..");
        if unsafe_name {
            return None;
        }
        Some(self.data_dir.join(format!("{}.csv", symbol)))
    }

    /// Parse a whole CSV file into a raw table, without period filtering
    pub fn read_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path.as_ref())?;

        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut rows = Vec::new();

        for (line, result) in reader.records().enumerate() {
            let record = result?;
            if record.iter().all(str::is_empty) {
                continue;
            }

            match record.get(0).and_then(parse_date) {
                Some(date) => rows.push(parse_row(date, &record, line + 1)?),
                None if rows.is_empty() => {
                    levels.push(record.iter().skip(1).map(str::to_string).collect());
                }
                None => {
                    return Err(AnalysisError::InvalidValue {
                        message: format!(
                            "line {}: expected a date in the first column, found '{}'",
                            line + 1,
                            record.get(0).unwrap_or_default()
                        ),
                    });
                }
            }
        }

        let header = match levels.len() {
            // Headerless files are labelled by position
            0 => ColumnHeader::Flat(
                (1..=rows.first().map_or(0, |r: &RawRow| r.values.len()))
                    .map(|i| format!("column_{}", i))
                    .collect(),
            ),
            1 => ColumnHeader::Flat(levels.remove(0)),
            _ => ColumnHeader::Nested(levels),
        };

        Ok(RawTable::new(header, rows))
    }
}

impl SeriesSource for CsvSeriesSource {
    fn fetch(&self, symbol: &str, period: Period) -> Result<RawTable> {
        let path = self
            .path_for(symbol)
            .filter(|p| p.is_file())
            .ok_or_else(|| AnalysisError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;

        let mut table = Self::read_table(&path)?;
        let newest = table.rows.iter().map(|r| r.date).max();

        if let Some(start) = newest.and_then(|end| period.start_from(end)) {
            table.rows.retain(|row| row.date > start);
        }

        debug!(
            symbol,
            %period,
            path = %path.display(),
            rows = table.rows.len(),
            "loaded raw table"
        );
        Ok(table)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let day = cell.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_row(date: NaiveDate, record: &StringRecord, line: usize) -> Result<RawRow> {
    let values = record
        .iter()
        .skip(1)
        .enumerate()
        .map(|(col, cell)| {
            cell.parse::<f64>().map_err(|_| AnalysisError::InvalidValue {
                message: format!(
                    "line {}, column {}: '{}' is not a number",
                    line,
                    col + 2,
                    cell
                ),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawRow::new(date, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_flat_header_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "AAPL.csv",
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-02,10,11,9,10.5,1000\n\
             2024-01-03,10.5,12,10,11.5,1200\n",
        );

        let table = CsvSeriesSource::new(dir.path())
            .fetch("AAPL", Period::Max)
            .unwrap();
        assert_eq!(
            table.header,
            ColumnHeader::Flat(vec![
                "Open".into(),
                "High".into(),
                "Low".into(),
                "Close".into(),
                "Volume".into()
            ])
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].values, vec![10.5, 12.0, 10.0, 11.5, 1200.0]);
    }

    #[test]
    fn test_nested_header_file_with_timestamps() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "TCS.NS.csv",
            "Price,Open,High,Low,Close,Volume,Adj Close\n\
             Ticker,TCS.NS,TCS.NS,TCS.NS,TCS.NS,TCS.NS,TCS.NS\n\
             Date,,,,,,\n\
             2024-01-02 00:00:00+05:30,1,2,0.5,1.5,10,1.4\n",
        );

        let table = CsvSeriesSource::new(dir.path())
            .fetch("TCS.NS", Period::Max)
            .unwrap();
        match &table.header {
            ColumnHeader::Nested(levels) => assert_eq!(levels.len(), 3),
            other => panic!("expected nested header, got {:?}", other),
        }
        assert_eq!(table.header.flatten().len(), 6);
        assert_eq!(
            table.rows[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_period_filter_relative_to_newest_row() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "X.csv",
            "Date,Open,High,Low,Close,Volume\n\
             2023-12-01,1,1,1,1,1\n\
             2024-01-20,1,1,1,1,1\n\
             2024-01-25,1,1,1,1,1\n\
             2024-01-31,1,1,1,1,1\n",
        );

        let source = CsvSeriesSource::new(dir.path());
        assert_eq!(source.fetch("X", Period::OneWeek).unwrap().rows.len(), 2);
        assert_eq!(source.fetch("X", Period::OneMonth).unwrap().rows.len(), 3);
        assert_eq!(source.fetch("X", Period::Max).unwrap().rows.len(), 4);
    }

    #[test]
    fn test_unknown_symbol() {
        let dir = TempDir::new().unwrap();
        let source = CsvSeriesSource::new(dir.path());
        let err = source.fetch("NOPE", Period::OneYear).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownSymbol { .. }));
        let err = source.fetch("../etc/passwd", Period::OneYear).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_header_only_file_yields_empty_table() {
        let dir = TempDir::new().unwrap();
        write(&dir, "EMPTY.csv", "Date,Open,High,Low,Close,Volume\n");
        let table = CsvSeriesSource::new(dir.path())
            .fetch("EMPTY", Period::OneYear)
            .unwrap();
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_non_numeric_cell_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "BAD.csv",
            "Date,Open,High,Low,Close,Volume\n2024-01-02,1,abc,1,1,1\n",
        );
        let err = CsvSeriesSource::new(dir.path())
            .fetch("BAD", Period::Max)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidValue { message } if message.contains("column 3")));
    }
}
