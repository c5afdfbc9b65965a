//! # StockScope
//!
//! Descriptive analytics and chart-page composition for daily OHLCV price series.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Days, NaiveDate};
//! use stockscope::{
//!     AnalyticsEngine, ChartPageComposer, ColumnHeader, RawRow, RawTable, SeriesNormalizer,
//! };
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let header = ColumnHeader::Flat(
//!     ["Open", "High", "Low", "Close", "Volume"].map(String::from).to_vec(),
//! );
//! let rows = (0..30u64)
//!     .map(|i| {
//!         let close = 100.0 + i as f64;
//!         RawRow::new(start + Days::new(i), vec![close, close + 1.0, close - 1.0, close, 1_000.0])
//!     })
//!     .collect();
//!
//! let series = SeriesNormalizer::new().normalize(&RawTable::new(header, rows)).unwrap();
//! let report = AnalyticsEngine::new().analyze(&series).unwrap();
//! assert_eq!(report.trading_days, 30);
//! assert!(report.ma20.is_some());
//! assert!(report.ma50.is_none());
//!
//! let pages = ChartPageComposer::new().compose(&series, &report);
//! assert_eq!(pages.len(), 4);
//! ```
//!
//! ## Pipeline
//!
//! 1. **Retrieval**: a [`SeriesSource`] turns a symbol and a [`Period`] into a [`RawTable`]
//! 2. **Normalization**: [`SeriesNormalizer`] resolves the column layout and validates rows
//! 3. **Analytics**: [`AnalyticsEngine`] produces one [`AnalyticsReport`]
//! 4. **Composition**: [`ChartPageComposer`] lays the report out as four two-panel pages
//! 5. **Rendering**: a [`ChartSink`] draws each page
//!
//! [`Session`] drives these steps as an interactive loop.

pub mod analytics;
pub mod charts;
pub mod config;
pub mod errors;
pub mod normalizer;
pub mod period;
pub mod session;
pub mod source;
pub mod statistics;
pub mod summary;
pub mod types;

// Re-export commonly used types for convenience
pub use analytics::{AlignedSeries, AnalyticsEngine, AnalyticsReport, CorrelationMatrix};
pub use charts::{
    BarDirection, ChartPage, ChartPageComposer, HeatmapCell, HistogramBucket, OhlcBar, Panel,
    PanelContent, ReferenceKind, ReferenceLine, TextTone,
};
pub use config::{AppConfig, ColorSchemeKind, PageConfig};
pub use errors::{AnalysisError, Result};
pub use normalizer::{ColumnLayout, SeriesNormalizer};
pub use period::Period;
pub use session::{ChartSink, RunSummary, Session, SessionError, SessionState};
pub use source::{CsvSeriesSource, SeriesSource};
pub use summary::{render_summary, report_json};
pub use types::{ColumnHeader, OhlcvField, PriceRow, PriceSeries, RawRow, RawTable};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
