//! Panels and Layout Modes
//!
//! A layout mode decides which panels the new-tab page shows. Panel modes
//! hold ordered lists; the full-screen mode is a single grid of slots.

use serde::{Deserialize, Serialize};

/// Named region of the page holding dials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Panel {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    BottomFull,
    #[serde(rename = "full-screen-panel")]
    FullScreen,
    /// Synthetic panel used while browsing a non-root folder; never persisted
    Folder,
}

impl Panel {
    /// Every panel that can be persisted, in display order
    pub const PERSISTED: [Panel; 6] = [
        Panel::TopLeft,
        Panel::TopRight,
        Panel::BottomLeft,
        Panel::BottomRight,
        Panel::BottomFull,
        Panel::FullScreen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::TopLeft => "top-left",
            Panel::TopRight => "top-right",
            Panel::BottomLeft => "bottom-left",
            Panel::BottomRight => "bottom-right",
            Panel::BottomFull => "bottom-full",
            Panel::FullScreen => "full-screen-panel",
            Panel::Folder => "folder",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "top-left" => Some(Panel::TopLeft),
            "top-right" => Some(Panel::TopRight),
            "bottom-left" => Some(Panel::BottomLeft),
            "bottom-right" => Some(Panel::BottomRight),
            "bottom-full" => Some(Panel::BottomFull),
            "full-screen-panel" => Some(Panel::FullScreen),
            "folder" => Some(Panel::Folder),
            _ => None,
        }
    }

    /// Slot-addressed grid rather than a ranked list
    pub fn is_grid(&self) -> bool {
        matches!(self, Panel::FullScreen)
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active page layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LayoutMode {
    #[serde(rename = "2-panel")]
    TwoPanel,
    #[serde(rename = "3-panel")]
    ThreePanel,
    #[serde(rename = "4-panel")]
    FourPanel,
    #[default]
    #[serde(rename = "full-screen")]
    FullScreen,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::TwoPanel => "2-panel",
            LayoutMode::ThreePanel => "3-panel",
            LayoutMode::FourPanel => "4-panel",
            LayoutMode::FullScreen => "full-screen",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "2-panel" => Some(LayoutMode::TwoPanel),
            "3-panel" => Some(LayoutMode::ThreePanel),
            "4-panel" => Some(LayoutMode::FourPanel),
            "full-screen" => Some(LayoutMode::FullScreen),
            _ => None,
        }
    }

    /// Panels shown by this mode, in round-robin order
    pub fn panels(&self) -> &'static [Panel] {
        match self {
            LayoutMode::TwoPanel => &[Panel::TopLeft, Panel::TopRight],
            LayoutMode::ThreePanel => &[Panel::TopLeft, Panel::TopRight, Panel::BottomFull],
            LayoutMode::FourPanel => &[
                Panel::TopLeft,
                Panel::TopRight,
                Panel::BottomLeft,
                Panel::BottomRight,
            ],
            LayoutMode::FullScreen => &[Panel::FullScreen],
        }
    }

    pub fn is_full_screen(&self) -> bool {
        matches!(self, LayoutMode::FullScreen)
    }

    pub fn contains(&self, panel: Panel) -> bool {
        self.panels().contains(&panel)
    }

    /// Panel a new entry lands in when nothing better is known
    pub fn first_panel(&self) -> Panel {
        self.panels()[0]
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dial size preset, used to fit the full-screen grid to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DialSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl DialSize {
    pub fn pixels(&self) -> u32 {
        match self {
            DialSize::Small => 50,
            DialSize::Large => 80,
            DialSize::ExtraLarge => 100,
            DialSize::Tiny | DialSize::Medium => 60,
        }
    }
}

const GRID_PADDING_PX: u32 = 40;
const GRID_GAP_PX: u32 = 8;
const GRID_HEADER_PX: u32 = 120;

/// Full-screen grid shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub cols: usize,
    pub rows: usize,
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self { cols: 10, rows: 6 }
    }
}

impl GridDimensions {
    pub const MIN: GridDimensions = GridDimensions { cols: 5, rows: 4 };

    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows }
    }

    pub fn total_slots(&self) -> usize {
        self.cols * self.rows
    }

    /// Fit as many dials as the viewport allows, never below `min`
    pub fn fit(width_px: u32, height_px: u32, dial: DialSize, min: GridDimensions) -> Self {
        let cell = dial.pixels() + GRID_GAP_PX;
        let avail_w = width_px.saturating_sub(GRID_PADDING_PX) + GRID_GAP_PX;
        let avail_h = height_px.saturating_sub(GRID_PADDING_PX + GRID_HEADER_PX) + GRID_GAP_PX;
        Self {
            cols: ((avail_w / cell) as usize).max(min.cols),
            rows: ((avail_h / cell) as usize).max(min.rows),
        }
    }
}
