//! Page layout: canvas size, margins and the two-panel split

use crate::errors::{Result, VisualizationError};
use serde::{Deserialize, Serialize};
use stockscope::PageConfig;

/// Layout of one chart page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Total page width in pixels
    pub width: u32,
    /// Total page height in pixels
    pub height: u32,
    /// Margin around each panel
    pub margins: Margins,
    /// Height reserved under each panel for x labels
    pub x_label_area: u32,
    /// Width reserved left of each panel for y labels
    pub y_label_area: u32,
    /// Approximate number of x-axis labels on dated panels
    pub x_ticks: usize,
    pub y_ticks: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: crate::DEFAULT_WIDTH,
            height: crate::DEFAULT_HEIGHT,
            margins: Margins::default(),
            x_label_area: 45,
            y_label_area: 80,
            x_ticks: 8,
            y_ticks: 8,
        }
    }
}

impl PageLayout {
    pub fn from_config(config: &PageConfig) -> Result<Self> {
        let layout = Self {
            width: config.width,
            height: config.height,
            ..Self::default()
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Each panel must keep a drawable area after margins and label areas.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.panel_size();
        let min_width = self.margins.left + self.margins.right + self.y_label_area;
        let min_height = self.margins.top + self.margins.bottom + self.x_label_area;
        if width <= min_width || height <= min_height {
            return Err(VisualizationError::LayoutError {
                message: format!(
                    "page {}x{} leaves no drawable area per panel",
                    self.width, self.height
                ),
            });
        }
        Ok(())
    }

    /// Size of one of the two vertically stacked panels
    pub fn panel_size(&self) -> (u32, u32) {
        (self.width, self.height / 2)
    }
}

/// Margin configuration for a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 20,
            right: 30,
            top: 15,
            bottom: 15,
        }
    }
}
