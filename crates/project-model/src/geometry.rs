//! Pixel geometry in output-frame space.
//!
//! `(0, 0)` is the top-left corner of the output frame. Positions may be
//! negative or exceed the frame when an item is parked off-screen.

use serde::{Deserialize, Serialize};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Top-left position that centers `item` inside `self`.
    ///
    /// Uses integer halving, matching how the encoder evaluates
    /// `(W-w)/2` on integer frame sizes.
    pub fn centered_origin(&self, item: Size) -> Point2D {
        let x = (self.width as i64 - item.width as i64).div_euclid(2);
        let y = (self.height as i64 - item.height as i64).div_euclid(2);
        Point2D::new(x as f64, y as f64)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A 2D pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        Point2D {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    /// Whether an item of `item` size placed here overlaps the frame at all.
    pub fn overlaps_frame(&self, item: Size, frame: Size) -> bool {
        self.x < frame.width as f64
            && self.y < frame.height as f64
            && self.x + item.width as f64 > 0.0
            && self.y + item.height as f64 > 0.0
    }
}
