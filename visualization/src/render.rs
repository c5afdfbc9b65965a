//! PNG rendering of composed chart pages
//!
//! Dated panels use a positional x axis (one unit per trading day) with
//! date labels, so weekends and holidays do not leave gaps.

use crate::errors::{Result, VisualizationError};
use crate::layouts::PageLayout;
use crate::styles::{coolwarm, PageStyle};
use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use stockscope::charts::DatedValue;
use stockscope::{
    ChartPage, ChartSink, HeatmapCell, HistogramBucket, OhlcBar, Panel, PanelContent,
    ReferenceKind, ReferenceLine,
};
use tracing::{debug, info};

/// Positional x axis over trading dates
#[derive(Debug, Clone, PartialEq)]
pub struct DateAxis {
    dates: Vec<NaiveDate>,
}

impl DateAxis {
    /// `dates` must be ascending
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self { dates }
    }

    pub fn from_points(points: &[DatedValue]) -> Self {
        Self::new(points.iter().map(|(date, _)| *date).collect())
    }

    pub fn position(&self, date: NaiveDate) -> Option<f64> {
        self.dates.binary_search(&date).ok().map(|i| i as f64)
    }

    /// Half a slot of padding on both ends
    pub fn range(&self) -> Range<f64> {
        -0.5..(self.dates.len() as f64 - 0.5)
    }

    /// Label for an axis value; empty between or outside the slots
    pub fn label(&self, x: f64) -> String {
        let index = x.round();
        if index < 0.0 || (x - index).abs() > 0.25 {
            return String::new();
        }
        self.dates
            .get(index as usize)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Value range with 5% headroom; a flat range is widened so it stays drawable
pub fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Option<Range<f64>> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

    let span = max - min;
    let pad = if span > f64::EPSILON {
        span * 0.05
    } else {
        (max.abs() * 0.05).max(0.5)
    };
    Some((min - pad)..(max + pad))
}

/// File name of one page: `<symbol>_page<N>.png`
///
/// Characters outside `[A-Za-z0-9._-]` become `_`.
pub fn page_file_name(symbol: &str, number: usize) -> String {
    let safe: String = symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_page{}.png", safe, number)
}

/// Compact axis label for large counts (1.5K, 2.3M, 1.1B)
pub fn compact_number(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}

struct SeriesLine<'a> {
    label: &'a str,
    points: &'a [DatedValue],
    color: RGBColor,
}

/// Writes each page as `<output_dir>/<symbol>_page<N>.png`
pub struct PngPageRenderer {
    output_dir: PathBuf,
    layout: PageLayout,
    style: PageStyle,
    written: Vec<PathBuf>,
}

impl PngPageRenderer {
    /// Creates `output_dir` when missing
    pub fn new<P: AsRef<Path>>(output_dir: P, layout: PageLayout, style: PageStyle) -> Result<Self> {
        layout.validate()?;
        fs::create_dir_all(output_dir.as_ref())?;
        Ok(Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            layout,
            style,
            written: Vec::new(),
        })
    }

    /// Every page written so far, in order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn page_path(&self, symbol: &str, number: usize) -> PathBuf {
        self.output_dir.join(page_file_name(symbol, number))
    }

    /// Render one page and return its path
    pub fn render(&mut self, symbol: &str, page: &ChartPage) -> Result<PathBuf> {
        let path = self.page_path(symbol, page.number);
        {
            let root = BitMapBackend::new(&path, (self.layout.width, self.layout.height))
                .into_drawing_area();
            root.fill(&self.style.colors.background)?;

            let areas = root.split_evenly((2, 1));
            for (area, panel) in areas.iter().zip(page.panels.iter()) {
                debug!(page = page.number, title = panel.title, "drawing panel");
                self.draw_panel(area, panel)?;
            }
            root.present()?;
        }

        info!(symbol, page = page.number, path = %path.display(), "page written");
        self.written.push(path.clone());
        Ok(path)
    }

    fn draw_panel<DB>(&self, area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let colors = &self.style.colors;
        match &panel.content {
            PanelContent::PriceLine { close } => {
                let lines = [SeriesLine {
                    label: "Close",
                    points: close,
                    color: colors.line,
                }];
                self.draw_line_panel(area, panel, &lines, &[])
            }
            PanelContent::MovingAverages { close, ma20, ma50 } => {
                let mut lines = vec![SeriesLine {
                    label: "Close",
                    points: close,
                    color: colors.line,
                }];
                if let Some(ma20) = ma20 {
                    lines.push(SeriesLine {
                        label: "MA 20",
                        points: ma20,
                        color: colors.ma_short,
                    });
                }
                if let Some(ma50) = ma50 {
                    lines.push(SeriesLine {
                        label: "MA 50",
                        points: ma50,
                        color: colors.ma_long,
                    });
                }
                self.draw_line_panel(area, panel, &lines, &[])
            }
            PanelContent::VolumeBars { volume } => self.draw_volume_panel(area, panel, volume),
            PanelContent::ReturnHistogram { buckets } => {
                self.draw_histogram_panel(area, panel, buckets)
            }
            PanelContent::RollingVolatility { volatility } => {
                let lines = [SeriesLine {
                    label: "20-Day Volatility",
                    points: volatility,
                    color: colors.volatility,
                }];
                self.draw_line_panel(area, panel, &lines, &[])
            }
            PanelContent::SupportResistance { close, levels } => {
                let lines = [SeriesLine {
                    label: "Close",
                    points: close,
                    color: colors.line,
                }];
                self.draw_line_panel(area, panel, &lines, levels)
            }
            PanelContent::OhlcBars { bars } => self.draw_ohlc_panel(area, panel, bars),
            PanelContent::CorrelationHeatmap { labels, cells } => {
                self.draw_heatmap_panel(area, panel, labels, cells)
            }
            PanelContent::Blank => self.draw_blank(area, panel, "Not enough data for this chart"),
        }
    }

    fn title_style(&self) -> TextStyle<'_> {
        (self.style.font_family.as_str(), self.style.title_size)
            .into_font()
            .color(&self.style.colors.text)
    }

    fn label_style(&self) -> TextStyle<'_> {
        (self.style.font_family.as_str(), self.style.label_size)
            .into_font()
            .color(&self.style.colors.text)
    }

    fn reference_color(&self, kind: ReferenceKind) -> RGBColor {
        match kind {
            ReferenceKind::Support => self.style.colors.support,
            ReferenceKind::Resistance => self.style.colors.resistance,
            ReferenceKind::Current => self.style.colors.current,
        }
    }

    fn draw_blank<DB>(&self, area: &DrawingArea<DB, Shift>, panel: &Panel, message: &str) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let inner = area.titled(panel.title, self.title_style())?;
        let (width, height) = inner.dim_in_pixel();
        let style = self.label_style().pos(Pos::new(HPos::Center, VPos::Center));
        inner.draw_text(message, &style, ((width / 2) as i32, (height / 2) as i32))?;
        Ok(())
    }

    fn draw_line_panel<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
        lines: &[SeriesLine<'_>],
        levels: &[ReferenceLine],
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let Some(primary) = lines.first().filter(|l| !l.points.is_empty()) else {
            return self.draw_blank(area, panel, "No data");
        };
        let axis = DateAxis::from_points(primary.points);

        let values = lines
            .iter()
            .flat_map(|l| l.points.iter().map(|(_, v)| *v))
            .chain(levels.iter().map(|level| level.value));
        let y_range = padded_range(values).ok_or_else(|| VisualizationError::InvalidData {
            message: format!("{}: no finite values", panel.title),
        })?;

        let margins = &self.layout.margins;
        let mut chart = ChartBuilder::on(area)
            .caption(panel.title, self.title_style())
            .margin_top(margins.top)
            .margin_bottom(margins.bottom)
            .margin_left(margins.left)
            .margin_right(margins.right)
            .x_label_area_size(self.layout.x_label_area)
            .y_label_area_size(self.layout.y_label_area)
            .build_cartesian_2d(axis.range(), y_range)?;

        let x_fmt = |x: &f64| axis.label(*x);
        let y_fmt = |y: &f64| format!("{:.2}", y);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(self.layout.x_ticks)
            .y_labels(self.layout.y_ticks)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style(self.label_style())
            .axis_desc_style(self.label_style())
            .light_line_style(self.style.colors.grid.mix(self.style.grid_opacity))
            .bold_line_style(self.style.colors.grid.mix(self.style.grid_opacity * 2.0))
            .axis_style(self.style.colors.border);
        if let Some(desc) = panel.x_label {
            mesh.x_desc(desc);
        }
        if let Some(desc) = panel.y_label {
            mesh.y_desc(desc);
        }
        mesh.draw()?;

        let width = self.style.line_width;
        for line in lines {
            let points: Vec<(f64, f64)> = line
                .points
                .iter()
                .filter_map(|(date, v)| axis.position(*date).map(|x| (x, *v)))
                .collect();
            let color = line.color;

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(width)))?
                .label(line.label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
                });
            if points.len() == 1 {
                chart.draw_series(points.iter().map(|p| Circle::new(*p, 3, color.filled())))?;
            }
        }

        let (x_start, x_end) = (axis.range().start, axis.range().end);
        for level in levels {
            let color = self.reference_color(level.kind);
            chart
                .draw_series(LineSeries::new(
                    vec![(x_start, level.value), (x_end, level.value)],
                    color.stroke_width(width),
                ))?
                .label(level.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(self.style.colors.background.mix(0.85))
            .border_style(self.style.colors.border)
            .label_font(self.label_style())
            .draw()?;
        Ok(())
    }

    fn draw_volume_panel<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
        volume: &[DatedValue],
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        if volume.is_empty() {
            return self.draw_blank(area, panel, "No data");
        }
        let axis = DateAxis::from_points(volume);
        let top = volume.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let top = if top > 0.0 { top * 1.05 } else { 1.0 };

        let margins = &self.layout.margins;
        let mut chart = ChartBuilder::on(area)
            .caption(panel.title, self.title_style())
            .margin_top(margins.top)
            .margin_bottom(margins.bottom)
            .margin_left(margins.left)
            .margin_right(margins.right)
            .x_label_area_size(self.layout.x_label_area)
            .y_label_area_size(self.layout.y_label_area)
            .build_cartesian_2d(axis.range(), 0f64..top)?;

        let x_fmt = |x: &f64| axis.label(*x);
        let y_fmt = |y: &f64| compact_number(*y);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(self.layout.x_ticks)
            .y_labels(self.layout.y_ticks)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style(self.label_style())
            .axis_desc_style(self.label_style())
            .light_line_style(self.style.colors.grid.mix(self.style.grid_opacity))
            .axis_style(self.style.colors.border);
        if let Some(desc) = panel.x_label {
            mesh.x_desc(desc);
        }
        if let Some(desc) = panel.y_label {
            mesh.y_desc(desc);
        }
        mesh.draw()?;

        let fill = self.style.colors.volume.mix(0.8).filled();
        chart.draw_series(volume.iter().enumerate().map(|(i, (_, v))| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], fill)
        }))?;
        Ok(())
    }

    fn draw_histogram_panel<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
        buckets: &[HistogramBucket],
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
            return self.draw_blank(area, panel, "No daily returns in this period");
        };
        let x_range = if last.upper > first.lower {
            first.lower..last.upper
        } else {
            (first.lower - 0.5)..(first.lower + 0.5)
        };
        let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0);
        let top = (max_count.max(1) as f64) * 1.1;

        let margins = &self.layout.margins;
        let mut chart = ChartBuilder::on(area)
            .caption(panel.title, self.title_style())
            .margin_top(margins.top)
            .margin_bottom(margins.bottom)
            .margin_left(margins.left)
            .margin_right(margins.right)
            .x_label_area_size(self.layout.x_label_area)
            .y_label_area_size(self.layout.y_label_area)
            .build_cartesian_2d(x_range, 0f64..top)?;

        let x_fmt = |x: &f64| format!("{:.1}%", x);
        let y_fmt = |y: &f64| format!("{:.0}", y);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(self.layout.x_ticks)
            .y_labels(self.layout.y_ticks)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style(self.label_style())
            .axis_desc_style(self.label_style())
            .light_line_style(self.style.colors.grid.mix(self.style.grid_opacity))
            .axis_style(self.style.colors.border);
        if let Some(desc) = panel.x_label {
            mesh.x_desc(desc);
        }
        if let Some(desc) = panel.y_label {
            mesh.y_desc(desc);
        }
        mesh.draw()?;

        let fill = self.style.colors.histogram.mix(0.75).filled();
        let edge = self.style.colors.border.stroke_width(1);
        chart.draw_series(
            buckets
                .iter()
                .map(|b| Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], fill)),
        )?;
        chart.draw_series(
            buckets
                .iter()
                .filter(|b| b.count > 0)
                .map(|b| Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], edge)),
        )?;
        Ok(())
    }

    fn draw_ohlc_panel<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
        bars: &[OhlcBar],
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        if bars.is_empty() {
            return self.draw_blank(area, panel, "No data");
        }
        let axis = DateAxis::new(bars.iter().map(|b| b.date).collect());
        let y_range = padded_range(bars.iter().flat_map(|b| [b.low, b.high]))
            .ok_or_else(|| VisualizationError::InvalidData {
                message: format!("{}: no finite prices", panel.title),
            })?;

        let margins = &self.layout.margins;
        let mut chart = ChartBuilder::on(area)
            .caption(panel.title, self.title_style())
            .margin_top(margins.top)
            .margin_bottom(margins.bottom)
            .margin_left(margins.left)
            .margin_right(margins.right)
            .x_label_area_size(self.layout.x_label_area)
            .y_label_area_size(self.layout.y_label_area)
            .build_cartesian_2d(axis.range(), y_range)?;

        let x_fmt = |x: &f64| axis.label(*x);
        let y_fmt = |y: &f64| format!("{:.2}", y);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(self.layout.x_ticks)
            .y_labels(self.layout.y_ticks)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style(self.label_style())
            .axis_desc_style(self.label_style())
            .light_line_style(self.style.colors.grid.mix(self.style.grid_opacity))
            .axis_style(self.style.colors.border);
        if let Some(desc) = panel.x_label {
            mesh.x_desc(desc);
        }
        if let Some(desc) = panel.y_label {
            mesh.y_desc(desc);
        }
        mesh.draw()?;

        let colors = self.style.colors;
        let wick = self.style.wick_width;
        let body = self.style.body_width;

        chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let x = i as f64;
            let color = colors.bar_color(bar.direction);
            PathElement::new(vec![(x, bar.low), (x, bar.high)], color.stroke_width(wick))
        }))?;
        chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let x = i as f64;
            let color = colors.bar_color(bar.direction);
            // A flat body would be invisible as a vertical segment
            let points = if bar.open == bar.close {
                vec![(x - 0.25, bar.open), (x + 0.25, bar.open)]
            } else {
                vec![(x, bar.open), (x, bar.close)]
            };
            PathElement::new(points, color.stroke_width(body))
        }))?;
        Ok(())
    }

    fn draw_heatmap_panel<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
        labels: &[&'static str],
        cells: &[HeatmapCell],
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let size = labels.len() as i32;
        if size == 0 {
            return self.draw_blank(area, panel, "No data");
        }

        let (width, _) = area.dim_in_pixel();
        let grid_area = if width > COLORBAR_WIDTH * 4 {
            let (grid_area, bar_area) = area.split_horizontally(width - COLORBAR_WIDTH);
            self.draw_colorbar(&bar_area)?;
            grid_area
        } else {
            area.clone()
        };

        let margins = &self.layout.margins;
        // Reversed y range puts the first row at the top
        let mut chart = ChartBuilder::on(&grid_area)
            .caption(panel.title, self.title_style())
            .margin_top(margins.top)
            .margin_bottom(margins.bottom)
            .margin_left(margins.left)
            .margin_right(margins.right)
            .x_label_area_size(self.layout.x_label_area)
            .y_label_area_size(self.layout.y_label_area)
            .build_cartesian_2d(0i32..size, size..0i32)?;

        let (plot_w, plot_h) = chart.plotting_area().dim_in_pixel();
        let cell_w = (plot_w / size as u32) as i32;
        let cell_h = (plot_h / size as u32) as i32;

        let label_of = |v: &i32| {
            usize::try_from(*v)
                .ok()
                .and_then(|i| labels.get(i))
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .x_labels(labels.len() + 1)
            .y_labels(labels.len() + 1)
            .x_label_offset(cell_w / 2)
            .y_label_offset(cell_h / 2)
            .x_label_formatter(&label_of)
            .y_label_formatter(&label_of)
            .disable_x_mesh()
            .disable_y_mesh()
            .label_style(self.label_style())
            .axis_style(self.style.colors.border)
            .draw()?;

        chart.draw_series(cells.iter().map(|cell| {
            let (x, y) = (cell.col as i32, cell.row as i32);
            Rectangle::new([(x, y), (x + 1, y + 1)], coolwarm(cell.value).filled())
        }))?;

        let family = self.style.font_family.as_str();
        chart.draw_series(cells.iter().map(|cell| {
            let style = (family, self.style.annotation_size)
                .into_font()
                .color(&self.style.tone_color(cell.tone))
                .pos(Pos::new(HPos::Center, VPos::Center));
            EmptyElement::at((cell.col as i32, cell.row as i32))
                + Text::new(cell.annotation.clone(), (cell_w / 2, cell_h / 2), style)
        }))?;
        Ok(())
    }

    /// Vertical coolwarm legend over the fixed [-1, 1] coefficient scale
    fn draw_colorbar<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let margins = &self.layout.margins;
        let mut chart = ChartBuilder::on(area)
            .margin_top(margins.top + self.style.title_size as u32 + 10)
            .margin_bottom(margins.bottom + self.layout.x_label_area)
            .margin_left(5)
            .margin_right(5)
            .right_y_label_area_size(60)
            .build_cartesian_2d(0.0..1.0, -1.0..1.0)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .disable_x_axis()
            .y_labels(5)
            .y_label_formatter(&|v| format!("{:.1}", v))
            .y_desc("Correlation")
            .label_style(self.label_style())
            .axis_style(self.style.colors.border)
            .draw()?;

        chart.draw_series(colorbar_steps(COLORBAR_STEPS).into_iter().map(|(lo, hi, mid)| {
            Rectangle::new([(0.0, lo), (1.0, hi)], coolwarm(Some(mid)).filled())
        }))?;
        Ok(())
    }
}

const COLORBAR_WIDTH: u32 = 90;
const COLORBAR_STEPS: usize = 64;

/// Contiguous `(low, high, midpoint)` slices covering `[-1, 1]`
pub fn colorbar_steps(count: usize) -> Vec<(f64, f64, f64)> {
    let count = count.max(1);
    let step = 2.0 / count as f64;
    (0..count)
        .map(|i| {
            let lo = -1.0 + step * i as f64;
            let hi = if i + 1 == count { 1.0 } else { lo + step };
            (lo, hi, (lo + hi) / 2.0)
        })
        .collect()
}

impl ChartSink for PngPageRenderer {
    type Error = VisualizationError;

    fn render_page(&mut self, symbol: &str, page: &ChartPage) -> Result<()> {
        self.render(symbol, page).map(|_| ())
    }
}
