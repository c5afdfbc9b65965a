//! Visual styling and color schemes for chart pages

use plotters::style::RGBColor;
use stockscope::{BarDirection, ColorSchemeKind, TextTone};

/// Color scheme for one rendered page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    /// Up bars (close >= open)
    pub up: RGBColor,
    /// Down bars
    pub down: RGBColor,
    /// Primary series line (close price)
    pub line: RGBColor,
    pub ma_short: RGBColor,
    pub ma_long: RGBColor,
    pub volume: RGBColor,
    pub histogram: RGBColor,
    pub volatility: RGBColor,
    pub support: RGBColor,
    pub resistance: RGBColor,
    pub current: RGBColor,
    pub background: RGBColor,
    pub grid: RGBColor,
    pub text: RGBColor,
    pub border: RGBColor,
}

impl ColorScheme {
    /// Traditional green/red color scheme
    pub fn traditional() -> Self {
        Self {
            up: RGBColor(34, 139, 34),        // Forest Green
            down: RGBColor(220, 20, 60),      // Crimson
            line: RGBColor(31, 119, 180),     // Steel blue
            ma_short: RGBColor(255, 127, 14), // Orange
            ma_long: RGBColor(148, 103, 189), // Purple
            volume: RGBColor(100, 149, 237),  // Cornflower
            histogram: RGBColor(70, 130, 180),
            volatility: RGBColor(214, 39, 40),
            support: RGBColor(34, 139, 34),
            resistance: RGBColor(220, 20, 60),
            current: RGBColor(255, 165, 0),
            background: RGBColor(248, 248, 255), // Ghost White
            grid: RGBColor(192, 192, 192),       // Silver
            text: RGBColor(47, 79, 79),          // Dark Slate Gray
            border: RGBColor(105, 105, 105),     // Dim Gray
        }
    }

    /// Dark theme color scheme
    pub fn dark() -> Self {
        Self {
            up: RGBColor(0, 200, 83),
            down: RGBColor(255, 77, 77),
            line: RGBColor(100, 181, 246),
            ma_short: RGBColor(255, 193, 7),
            ma_long: RGBColor(206, 147, 216),
            volume: RGBColor(79, 195, 247),
            histogram: RGBColor(129, 199, 132),
            volatility: RGBColor(255, 138, 101),
            support: RGBColor(0, 200, 83),
            resistance: RGBColor(255, 77, 77),
            current: RGBColor(255, 193, 7),
            background: RGBColor(21, 23, 25),
            grid: RGBColor(64, 68, 75),
            text: RGBColor(208, 210, 214),
            border: RGBColor(128, 128, 128),
        }
    }

    /// High contrast color scheme for accessibility
    pub fn high_contrast() -> Self {
        Self {
            up: RGBColor(0, 160, 0),
            down: RGBColor(255, 0, 0),
            line: RGBColor(0, 0, 0),
            ma_short: RGBColor(0, 0, 255),
            ma_long: RGBColor(255, 0, 255),
            volume: RGBColor(0, 0, 0),
            histogram: RGBColor(0, 0, 0),
            volatility: RGBColor(255, 0, 0),
            support: RGBColor(0, 160, 0),
            resistance: RGBColor(255, 0, 0),
            current: RGBColor(0, 0, 255),
            background: RGBColor(255, 255, 255),
            grid: RGBColor(0, 0, 0),
            text: RGBColor(0, 0, 0),
            border: RGBColor(0, 0, 0),
        }
    }

    pub fn from_kind(kind: ColorSchemeKind) -> Self {
        match kind {
            ColorSchemeKind::Traditional => Self::traditional(),
            ColorSchemeKind::Dark => Self::dark(),
            ColorSchemeKind::HighContrast => Self::high_contrast(),
        }
    }

    pub fn bar_color(&self, direction: BarDirection) -> RGBColor {
        match direction {
            BarDirection::Up => self.up,
            BarDirection::Down => self.down,
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::traditional()
    }
}

/// Stroke widths and font sizes shared by every panel
#[derive(Debug, Clone)]
pub struct PageStyle {
    pub colors: ColorScheme,
    pub font_family: String,
    pub title_size: f64,
    pub label_size: f64,
    pub annotation_size: f64,
    pub line_width: u32,
    /// OHLC low-high range line
    pub wick_width: u32,
    /// OHLC open-close body
    pub body_width: u32,
    pub grid_opacity: f64,
}

impl Default for PageStyle {
    fn default() -> Self {
        Self {
            colors: ColorScheme::traditional(),
            font_family: "sans-serif".to_string(),
            title_size: 22.0,
            label_size: 13.0,
            annotation_size: 16.0,
            line_width: 2,
            wick_width: 1,
            body_width: 4,
            grid_opacity: 0.3,
        }
    }
}

impl PageStyle {
    pub fn with_colors(colors: ColorScheme) -> Self {
        Self {
            colors,
            ..Self::default()
        }
    }

    /// Heatmap annotation color for a contrast tier
    pub fn tone_color(&self, tone: TextTone) -> RGBColor {
        match tone {
            TextTone::Light => RGBColor(255, 255, 255),
            TextTone::Dark => RGBColor(20, 20, 20),
        }
    }
}

/// Diverging blue-white-red colormap for coefficients in `[-1, 1]`
///
/// `None` (undefined coefficient) maps to neutral gray.
pub fn coolwarm(value: Option<f64>) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let Some(value) = value else {
        return RGBColor(160, 160, 160);
    };
    let t = value.clamp(-1.0, 1.0);
    let (from, to, frac) = if t < 0.0 {
        (MID, COLD, -t)
    } else {
        (MID, WARM, t)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * frac).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
