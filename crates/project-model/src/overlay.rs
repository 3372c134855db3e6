//! Overlay items and their display schedule.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ParseNameError;

/// What an overlay item shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayContent {
    /// An image file composited over the host video.
    Image { path: PathBuf },
    /// A single-line caption.
    Text { text: String },
}

/// Enter/exit motion of an overlay item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStyle {
    #[default]
    SlideBottom,
    SlideTop,
    SlideLeft,
    SlideRight,
    /// Centered for the whole window.
    Fade,
    /// Resolved per item to one of the concrete styles.
    Random,
}

impl AnimationStyle {
    /// Styles `Random` can resolve to.
    pub const CONCRETE: [AnimationStyle; 5] = [
        Self::SlideBottom,
        Self::SlideTop,
        Self::SlideLeft,
        Self::SlideRight,
        Self::Fade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlideBottom => "slide_bottom",
            Self::SlideTop => "slide_top",
            Self::SlideLeft => "slide_left",
            Self::SlideRight => "slide_right",
            Self::Fade => "fade",
            Self::Random => "random",
        }
    }

    pub fn is_random(self) -> bool {
        matches!(self, Self::Random)
    }
}

impl fmt::Display for AnimationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimationStyle {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "slide_bottom" => Ok(Self::SlideBottom),
            "slide_top" => Ok(Self::SlideTop),
            "slide_left" => Ok(Self::SlideLeft),
            "slide_right" => Ok(Self::SlideRight),
            "fade" => Ok(Self::Fade),
            "random" => Ok(Self::Random),
            _ => Err(ParseNameError {
                kind: "animation style",
                value: s.to_string(),
                expected: "slide_bottom, slide_top, slide_left, slide_right, fade, random",
            }),
        }
    }
}

/// Half-open display interval in host-video seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayWindow {
    pub start: f64,
    pub end: f64,
}

impl DisplayWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Visibility gate, inclusive on both ends like `between(t,a,b)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Output of the overlay scheduler.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlaySchedule {
    /// Effective per-item duration after any rescale.
    pub per_item_duration: f64,
    /// Effective gap between consecutive items after any rescale.
    pub delay: f64,
    pub windows: Vec<DisplayWindow>,
    /// End of the last window (0 when empty).
    pub total_duration: f64,
}

impl OverlaySchedule {
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Whether windows are strictly ordered and fit inside `host_duration`.
    pub fn is_well_formed(&self, host_duration: f64) -> bool {
        const EPS: f64 = 1e-9;
        let ordered = self
            .windows
            .windows(2)
            .all(|pair| pair[0].end <= pair[1].start + EPS);
        let bounded = self
            .windows
            .iter()
            .all(|w| w.start >= -EPS && w.start < w.end && w.end <= host_duration + EPS);
        ordered && bounded
    }
}

/// One scheduled overlay element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayItem {
    pub content: OverlayContent,
    pub window: DisplayWindow,
    /// Concrete style; `Random` is resolved before items are built.
    pub style: AnimationStyle,
}

impl OverlayItem {
    pub fn start(&self) -> f64 {
        self.window.start
    }

    pub fn end(&self) -> f64 {
        self.window.end
    }
}

/// Enter/hold/exit sub-intervals of one display window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationWindow {
    pub enter_duration: f64,
    pub hold_start: f64,
    pub hold_end: f64,
    pub exit_start: f64,
    pub exit_duration: f64,
}

/// Font size and background box for a one-line caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLayout {
    pub font_size: u32,
    /// Even width in pixels.
    pub box_width: u32,
    /// Even height in pixels.
    pub box_height: u32,
}
