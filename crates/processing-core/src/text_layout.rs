//! One-line caption layout.

use reelcut_common::config::EngineConfig;
use reelcut_project_model::geometry::{Point2D, Size};
use reelcut_project_model::overlay::TextLayout;

/// Share of the frame width a caption may span.
pub const TEXT_WIDTH_RATIO: f64 = 0.85;

/// Average glyph advance as a multiple of the font size.
pub const CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.5;

/// Caption layout parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayoutConfig {
    pub min_font_size: u32,
    pub max_font_size: u32,
    /// Padding inside the box on every side (px).
    pub padding: u32,
    /// Gap between the box and the bottom edge (px).
    pub bottom_margin: u32,
}

impl Default for TextLayoutConfig {
    fn default() -> Self {
        Self {
            min_font_size: 24,
            max_font_size: 80,
            padding: 20,
            bottom_margin: 100,
        }
    }
}

impl From<&EngineConfig> for TextLayoutConfig {
    fn from(engine: &EngineConfig) -> Self {
        Self {
            min_font_size: engine.text_min_font_size,
            max_font_size: engine.text_max_font_size,
            padding: engine.text_padding,
            bottom_margin: engine.text_bottom_margin,
        }
    }
}

/// Sizes captions so they stay on a single line.
pub struct TextLayoutEngine {
    config: TextLayoutConfig,
}

impl TextLayoutEngine {
    pub fn new(config: TextLayoutConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TextLayoutConfig::default())
    }

    pub fn config(&self) -> &TextLayoutConfig {
        &self.config
    }

    /// Largest font size that keeps `text` within 85% of `frame_width`,
    /// clamped to the configured bounds. Length counts Unicode scalar values.
    ///
    /// If the bounds are inverted the maximum wins.
    pub fn font_size(&self, text: &str, frame_width: u32) -> u32 {
        let len = text.chars().count();
        if len == 0 {
            return self.config.max_font_size;
        }
        let available = frame_width as f64 * TEXT_WIDTH_RATIO;
        let raw = (available / (len as f64 * CHAR_WIDTH_FACTOR)).floor();
        let raw = if raw.is_finite() && raw > 0.0 { raw as u32 } else { 0 };
        raw.max(self.config.min_font_size)
            .min(self.config.max_font_size)
    }

    /// Font size and background box for `text`.
    pub fn layout(&self, text: &str, frame_width: u32) -> TextLayout {
        let font_size = self.font_size(text, frame_width);
        let len = text.chars().count() as f64;
        let pad = 2 * self.config.padding;

        let box_width = (len * font_size as f64 * CHAR_WIDTH_FACTOR).floor() as u32 + pad;
        let box_height = (font_size as f64 * LINE_HEIGHT_FACTOR).floor() as u32 + pad;

        TextLayout {
            font_size,
            box_width: round_up_even(box_width),
            box_height: round_up_even(box_height),
        }
    }

    /// Top-left corner of the caption box: horizontally centered,
    /// `bottom_margin` above the bottom edge.
    pub fn box_origin(&self, layout: &TextLayout, frame: Size) -> Point2D {
        let x = (frame.width as f64 - layout.box_width as f64) / 2.0;
        let y = frame.height as f64 - layout.box_height as f64 - self.config.bottom_margin as f64;
        Point2D::new(x, y)
    }

    /// Whether the box lies entirely inside the frame.
    pub fn fits(&self, layout: &TextLayout, frame: Size) -> bool {
        let origin = self.box_origin(layout, frame);
        origin.x >= 0.0 && origin.y >= 0.0 && layout.box_width <= frame.width
    }
}

fn round_up_even(v: u32) -> u32 {
    v + v % 2
}
