//! Error types for series normalization and analytics

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during one analysis run
///
/// Every variant is local to a single run: the interactive session reports it
/// and offers to retry instead of terminating.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Retrieval produced zero rows ("no such instrument / no data in period")
    #[error("No data found: the series contains zero rows")]
    EmptySeries,

    /// Fewer rows than a load-bearing metric requires
    #[error("Insufficient data for {metric}: need at least {required} row(s), got {actual}")]
    InsufficientData {
        metric: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Division by zero while computing {context}")]
    DivisionByZero { context: String },

    #[error("Malformed columns: {message}")]
    MalformedColumns { message: String },

    #[error("Duplicate date in series: {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("No data available for symbol '{symbol}'")]
    UnknownSymbol { symbol: String },

    #[error("File I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV error: {source}")]
    CsvError {
        #[from]
        source: csv::Error,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl AnalysisError {
    /// True when the run failed because there was nothing to analyze.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptySeries | AnalysisError::UnknownSymbol { .. }
        )
    }
}

impl From<config::ConfigError> for AnalysisError {
    fn from(err: config::ConfigError) -> Self {
        AnalysisError::ConfigError {
            message: err.to_string(),
        }
    }
}
