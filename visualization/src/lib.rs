//! StockScope Visualization Library
//!
//! Draws the four composed chart pages of an analysis run as PNG files:
//! - Two vertically stacked panels per page
//! - Date-labelled line, bar and OHLC panels
//! - Return histogram and annotated correlation heatmap
//!
//! # Architecture
//!
//! - `layouts`: Page size, margins and the two-panel split
//! - `styles`: Color schemes, fonts and the heatmap colormap
//! - `render`: [`PngPageRenderer`], the [`stockscope::ChartSink`] used by the CLI

pub mod errors;
pub mod layouts;
pub mod render;
pub mod styles;

// Re-export key types for convenience
pub use errors::{Result, VisualizationError};
pub use layouts::{Margins, PageLayout};
pub use render::{DateAxis, PngPageRenderer};
pub use styles::{ColorScheme, PageStyle};

/// Version of the visualization library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default page dimensions for export
pub const DEFAULT_WIDTH: u32 = 1400;
pub const DEFAULT_HEIGHT: u32 = 1000;
