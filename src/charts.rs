//! Chart-page composition
//!
//! Decides what each of the eight standard charts shows, without drawing
//! anything. A page set is always four pages of two panels; a metric the
//! engine omitted degrades its panel (fewer lines, or a blank panel) instead
//! of failing the set.

use crate::analytics::{AlignedSeries, AnalyticsReport, CorrelationMatrix};
use crate::types::{PriceRow, PriceSeries};
use chrono::NaiveDate;
use serde::Serialize;

/// Default number of histogram buckets for the daily-return distribution
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 30;
/// Trailing rows drawn in the OHLC bar chart
pub const OHLC_WINDOW: usize = 20;
/// Absolute correlation above which heatmap annotations switch to the light tone
pub const HEATMAP_CONTRAST_THRESHOLD: f64 = 0.5;

pub const PANEL_TITLES: [&str; 8] = [
    "1. PRICE CHART",
    "2. MOVING AVERAGES",
    "3. TRADING VOLUME",
    "4. DAILY RETURNS",
    "5. 20-DAY VOLATILITY",
    "6. SUPPORT & RESISTANCE",
    "7. OHLC BARS",
    "8. CORRELATION HEATMAP",
];

/// A dated value on a line or bar chart
pub type DatedValue = (NaiveDate, f64);

/// One equal-width histogram bucket `[lower, upper)`; the last bucket is closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceKind {
    Support,
    Resistance,
    Current,
}

/// Horizontal reference line with its display label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub kind: ReferenceKind,
    pub value: f64,
    pub label: String,
}

impl ReferenceLine {
    fn new(kind: ReferenceKind, value: f64) -> Self {
        let name = match kind {
            ReferenceKind::Support => "Support",
            ReferenceKind::Resistance => "Resistance",
            ReferenceKind::Current => "Current",
        };
        Self {
            kind,
            value,
            label: format!("{}: {:.2}", name, value),
        }
    }
}

/// Price direction of one OHLC bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BarDirection {
    Up,
    Down,
}

impl BarDirection {
    /// A bar closing at its open counts as up.
    pub fn classify(open: f64, close: f64) -> Self {
        if close >= open {
            BarDirection::Up
        } else {
            BarDirection::Down
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub direction: BarDirection,
}

impl From<&PriceRow> for OhlcBar {
    fn from(row: &PriceRow) -> Self {
        Self {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            direction: BarDirection::classify(row.open, row.close),
        }
    }
}

/// Contrast tier for heatmap annotation text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextTone {
    /// Light text on a saturated cell
    Light,
    /// Dark text on a pale cell
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub row: usize,
    pub col: usize,
    pub value: Option<f64>,
    pub annotation: String,
    pub tone: TextTone,
}

impl HeatmapCell {
    fn new(row: usize, col: usize, value: Option<f64>) -> Self {
        let (annotation, tone) = match value {
            Some(v) if v.abs() > HEATMAP_CONTRAST_THRESHOLD => (format!("{:.2}", v), TextTone::Light),
            Some(v) => (format!("{:.2}", v), TextTone::Dark),
            None => ("n/a".to_string(), TextTone::Dark),
        };
        Self {
            row,
            col,
            value,
            annotation,
            tone,
        }
    }
}

/// What a panel shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PanelContent {
    PriceLine {
        close: Vec<DatedValue>,
    },
    MovingAverages {
        close: Vec<DatedValue>,
        ma20: Option<Vec<DatedValue>>,
        ma50: Option<Vec<DatedValue>>,
    },
    VolumeBars {
        volume: Vec<DatedValue>,
    },
    ReturnHistogram {
        buckets: Vec<HistogramBucket>,
    },
    RollingVolatility {
        volatility: Vec<DatedValue>,
    },
    SupportResistance {
        close: Vec<DatedValue>,
        levels: Vec<ReferenceLine>,
    },
    OhlcBars {
        bars: Vec<OhlcBar>,
    },
    CorrelationHeatmap {
        labels: Vec<&'static str>,
        cells: Vec<HeatmapCell>,
    },
    /// Nothing to draw: the underlying metric was omitted
    Blank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: &'static str,
    pub x_label: Option<&'static str>,
    pub y_label: Option<&'static str>,
    pub content: PanelContent,
}

impl Panel {
    pub fn is_blank(&self) -> bool {
        matches!(self.content, PanelContent::Blank)
    }
}

/// One rendered page: exactly two panels, stacked vertically
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPage {
    /// 1-based page number
    pub number: usize,
    pub panels: [Panel; 2],
}

/// Builds the four chart pages from a series and its report
#[derive(Debug, Clone)]
pub struct ChartPageComposer {
    histogram_buckets: usize,
}

impl Default for ChartPageComposer {
    fn default() -> Self {
        Self {
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
        }
    }
}

impl ChartPageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `buckets` histogram buckets (at least one)
    pub fn with_histogram_buckets(buckets: usize) -> Self {
        Self {
            histogram_buckets: buckets.max(1),
        }
    }

    pub fn histogram_buckets(&self) -> usize {
        self.histogram_buckets
    }

    pub fn compose(&self, series: &PriceSeries, report: &AnalyticsReport) -> Vec<ChartPage> {
        let dates = series.dates();
        let close: Vec<DatedValue> = series.rows().iter().map(|r| (r.date, r.close)).collect();

        let price = Panel {
            title: PANEL_TITLES[0],
            x_label: Some("Date"),
            y_label: Some("Price"),
            content: PanelContent::PriceLine {
                close: close.clone(),
            },
        };

        let moving_averages = Panel {
            title: PANEL_TITLES[1],
            x_label: None,
            y_label: None,
            content: PanelContent::MovingAverages {
                close: close.clone(),
                ma20: report.ma20.as_ref().map(|ma| dated(&dates, ma, 0)),
                ma50: report.ma50.as_ref().map(|ma| dated(&dates, ma, 0)),
            },
        };

        let volume = Panel {
            title: PANEL_TITLES[2],
            x_label: Some("Date"),
            y_label: Some("Volume"),
            content: PanelContent::VolumeBars {
                volume: series
                    .rows()
                    .iter()
                    .map(|r| (r.date, r.volume as f64))
                    .collect(),
            },
        };

        let returns = Panel {
            title: PANEL_TITLES[3],
            x_label: Some("Daily Return %"),
            y_label: Some("Frequency"),
            content: PanelContent::ReturnHistogram {
                buckets: histogram(&report.daily_returns, self.histogram_buckets),
            },
        };

        // Returns start at the second date
        let volatility = match &report.rolling_volatility_20 {
            Some(rolling) => Panel {
                title: PANEL_TITLES[4],
                x_label: Some("Date"),
                y_label: Some("Volatility %"),
                content: PanelContent::RollingVolatility {
                    volatility: dated(&dates, rolling, 1),
                },
            },
            None => Panel {
                title: PANEL_TITLES[4],
                x_label: None,
                y_label: None,
                content: PanelContent::Blank,
            },
        };

        let support_resistance = Panel {
            title: PANEL_TITLES[5],
            x_label: None,
            y_label: None,
            content: PanelContent::SupportResistance {
                close,
                levels: vec![
                    ReferenceLine::new(ReferenceKind::Support, report.support),
                    ReferenceLine::new(ReferenceKind::Resistance, report.resistance),
                    ReferenceLine::new(ReferenceKind::Current, report.current_price()),
                ],
            },
        };

        let ohlc = Panel {
            title: PANEL_TITLES[6],
            x_label: Some("Date"),
            y_label: Some("Price"),
            content: PanelContent::OhlcBars {
                bars: series.tail(OHLC_WINDOW).iter().map(OhlcBar::from).collect(),
            },
        };

        let heatmap = Panel {
            title: PANEL_TITLES[7],
            x_label: None,
            y_label: None,
            content: heatmap_content(&report.correlation_matrix),
        };

        vec![
            ChartPage {
                number: 1,
                panels: [price, moving_averages],
            },
            ChartPage {
                number: 2,
                panels: [volume, returns],
            },
            ChartPage {
                number: 3,
                panels: [volatility, support_resistance],
            },
            ChartPage {
                number: 4,
                panels: [ohlc, heatmap],
            },
        ]
    }
}

/// Pair the defined values of `series` with dates, position `i` mapping to `dates[i + offset]`
fn dated(dates: &[NaiveDate], series: &AlignedSeries, offset: usize) -> Vec<DatedValue> {
    series
        .defined()
        .filter_map(|(i, v)| dates.get(i + offset).map(|d| (*d, v)))
        .collect()
}

fn heatmap_content(matrix: &CorrelationMatrix) -> PanelContent {
    let labels = CorrelationMatrix::FIELDS.iter().map(|f| f.label()).collect();
    let cells = (0..5)
        .flat_map(|row| (0..5).map(move |col| (row, col)))
        .map(|(row, col)| HeatmapCell::new(row, col, matrix.get(row, col)))
        .collect();
    PanelContent::CorrelationHeatmap { labels, cells }
}

/// Equal-width histogram over the value range.
///
/// A degenerate range (all values equal) is widened by 0.5 on both sides.
/// No values yields no buckets.
pub fn histogram(values: &[f64], buckets: usize) -> Vec<HistogramBucket> {
    let buckets = buckets.max(1);
    let (Some(mut lower), Some(mut upper)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };

    if lower == upper {
        lower -= 0.5;
        upper += 0.5;
    }

    let width = (upper - lower) / buckets as f64;
    let mut counts = vec![0usize; buckets];
    for v in values {
        let index = (((v - lower) / width).floor() as usize).min(buckets - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            lower: lower + i as f64 * width,
            upper: if i + 1 == buckets {
                upper
            } else {
                lower + (i + 1) as f64 * width
            },
            count,
        })
        .collect()
}
