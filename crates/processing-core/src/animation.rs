//! Overlay sizing and enter/hold/exit motion.
//!
//! An [`AnimationCurve`] is a pure piecewise-linear position function over
//! host time. Encoder expression syntax is produced elsewhere from
//! [`AnimationCurve::keyframes`].

use rand::seq::SliceRandom;
use rand::Rng;
use reelcut_common::config::EngineConfig;
use reelcut_project_model::geometry::{Point2D, Size};
use reelcut_project_model::overlay::{AnimationStyle, AnimationWindow, DisplayWindow};
use serde::{Deserialize, Serialize};

/// Distance past the frame edge where items wait before entering (px).
pub const OFFSCREEN_MARGIN: f64 = 100.0;

/// Largest share of a window either the enter or exit phase may take.
pub const MAX_ANIMATION_SHARE: f64 = 0.25;

/// Derive enter/hold/exit intervals for a display window.
pub fn animation_window(window: &DisplayWindow, configured_duration: f64) -> AnimationWindow {
    let anim = configured_duration
        .max(0.0)
        .min(window.duration().max(0.0) * MAX_ANIMATION_SHARE);
    AnimationWindow {
        enter_duration: anim,
        hold_start: window.start + anim,
        hold_end: window.end - anim,
        exit_start: window.end - anim,
        exit_duration: anim,
    }
}

/// Largest size an item may take inside `frame`.
pub fn max_item_size(frame: Size, max_ratio: f64) -> Size {
    Size::new(
        (frame.width as f64 * max_ratio) as u32,
        (frame.height as f64 * max_ratio) as u32,
    )
}

/// Shrink `item` to fit `max_ratio` of `frame`, preserving aspect ratio.
///
/// Items that already fit are returned unchanged. Shrunk sizes are rounded
/// down to even integers.
pub fn fit_item_size(item: Size, frame: Size, max_ratio: f64) -> Size {
    let max = max_item_size(frame, max_ratio);
    if item.width <= max.width && item.height <= max.height {
        return item;
    }
    if item.is_empty() || max.is_empty() {
        return max;
    }

    let item_aspect = item.aspect();
    let max_aspect = max.aspect();

    let (width, height) = if item_aspect > max_aspect {
        (max.width, (max.width as f64 / item_aspect) as u32)
    } else {
        ((max.height as f64 * item_aspect) as u32, max.height)
    };

    Size::new(width - width % 2, height - height % 2)
}

/// Resolve [`AnimationStyle::Random`] to a concrete style.
pub fn resolve_style<R: Rng + ?Sized>(style: AnimationStyle, rng: &mut R) -> AnimationStyle {
    if !style.is_random() {
        return style;
    }
    AnimationStyle::CONCRETE
        .choose(rng)
        .copied()
        .unwrap_or(AnimationStyle::Fade)
}

/// Piecewise position of one overlay item over host time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    pub window: DisplayWindow,
    pub phases: AnimationWindow,
    /// Concrete style the curve was built for.
    pub style: AnimationStyle,
    /// Resting position during the hold phase.
    pub center: Point2D,
    /// Parking position before entry and after exit.
    pub offscreen: Point2D,
}

impl AnimationCurve {
    /// Position at host time `t`.
    pub fn position_at(&self, t: f64) -> Point2D {
        let w = &self.window;
        let p = &self.phases;

        if t < w.start {
            return self.offscreen;
        }
        if t < p.hold_start && p.enter_duration > 0.0 {
            let f = (t - w.start) / p.enter_duration;
            return Point2D::lerp(&self.offscreen, &self.center, f);
        }
        if t < p.exit_start {
            return self.center;
        }
        if t <= w.end && p.exit_duration > 0.0 {
            let f = (t - p.exit_start) / p.exit_duration;
            return Point2D::lerp(&self.center, &self.offscreen, f);
        }
        if t <= w.end {
            return self.center;
        }
        self.offscreen
    }

    /// Whether the item is shown at `t`.
    pub fn is_visible(&self, t: f64) -> bool {
        self.window.contains(t)
    }

    /// Breakpoints of the curve, in time order.
    ///
    /// Linear interpolation between consecutive keyframes reproduces
    /// [`position_at`](Self::position_at) inside the window; outside it the
    /// position holds the first/last keyframe value.
    pub fn keyframes(&self) -> Vec<(f64, Point2D)> {
        let p = &self.phases;
        if p.enter_duration <= 0.0 {
            return vec![(self.window.start, self.center), (self.window.end, self.center)];
        }
        vec![
            (self.window.start, self.offscreen),
            (p.hold_start, self.center),
            (p.exit_start, self.center),
            (self.window.end, self.offscreen),
        ]
    }
}

/// Builds [`AnimationCurve`]s for overlay items.
#[derive(Debug, Clone)]
pub struct AnimationCurveBuilder {
    /// Configured enter/exit duration (seconds).
    pub animation_duration: f64,
    /// Off-screen parking margin (px).
    pub offscreen_margin: f64,
}

impl Default for AnimationCurveBuilder {
    fn default() -> Self {
        Self {
            animation_duration: 0.5,
            offscreen_margin: OFFSCREEN_MARGIN,
        }
    }
}

impl From<&EngineConfig> for AnimationCurveBuilder {
    fn from(engine: &EngineConfig) -> Self {
        Self {
            animation_duration: engine.animation_duration,
            ..Self::default()
        }
    }
}

impl AnimationCurveBuilder {
    pub fn new(animation_duration: f64) -> Self {
        Self {
            animation_duration,
            ..Self::default()
        }
    }

    /// Build the curve for one item. `Random` is resolved through `rng`.
    pub fn build<R: Rng + ?Sized>(
        &self,
        window: DisplayWindow,
        style: AnimationStyle,
        frame: Size,
        item: Size,
        rng: &mut R,
    ) -> AnimationCurve {
        let style = resolve_style(style, rng);
        let center = frame.centered_origin(item);
        let margin = self.offscreen_margin;

        let offscreen = match style {
            AnimationStyle::SlideBottom => Point2D::new(center.x, frame.height as f64 + margin),
            AnimationStyle::SlideTop => Point2D::new(center.x, -(item.height as f64) - margin),
            AnimationStyle::SlideLeft => Point2D::new(-(item.width as f64) - margin, center.y),
            AnimationStyle::SlideRight => Point2D::new(frame.width as f64 + margin, center.y),
            AnimationStyle::Fade | AnimationStyle::Random => center,
        };

        AnimationCurve {
            window,
            phases: animation_window(&window, self.animation_duration),
            style,
            center,
            offscreen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FRAME: Size = Size::new(1080, 1920);

    fn curve(style: AnimationStyle) -> AnimationCurve {
        AnimationCurveBuilder::default().build(
            DisplayWindow::new(2.0, 6.0),
            style,
            FRAME,
            Size::new(400, 300),
            &mut StdRng::seed_from_u64(1),
        )
    }

    #[test]
    fn test_animation_window_caps_at_quarter() {
        let aw = animation_window(&DisplayWindow::new(0.0, 1.0), 0.5);
        assert_eq!(aw.enter_duration, 0.25);
        assert_eq!(aw.hold_start, 0.25);
        assert_eq!(aw.exit_start, 0.75);

        let aw = animation_window(&DisplayWindow::new(0.0, 10.0), 0.5);
        assert_eq!(aw.enter_duration, 0.5);
    }

    #[test]
    fn test_fit_keeps_small_items() {
        let item = Size::new(501, 333);
        assert_eq!(fit_item_size(item, FRAME, 0.85), item);
    }

    #[test]
    fn test_fit_shrinks_wide_item_to_even() {
        // max = 918x1632; aspect 2.0 > 0.5625 so width-limited
        let fitted = fit_item_size(Size::new(2000, 1000), FRAME, 0.85);
        assert_eq!(fitted, Size::new(918, 458));
    }

    #[test]
    fn test_fit_shrinks_tall_item() {
        // aspect 0.25 < 0.5625 so height-limited: 1632 x 408
        let fitted = fit_item_size(Size::new(1000, 4000), FRAME, 0.85);
        assert_eq!(fitted, Size::new(408, 1632));
    }

    #[test]
    fn test_slide_bottom_positions() {
        let c = curve(AnimationStyle::SlideBottom);
        // center = ((1080-400)/2, (1920-300)/2)
        assert_eq!(c.center, Point2D::new(340.0, 810.0));
        assert_eq!(c.position_at(1.0), Point2D::new(340.0, 2020.0));
        assert_eq!(c.position_at(2.5), c.center);
        assert_eq!(c.position_at(5.5), c.center);
        assert_eq!(c.position_at(6.0), c.offscreen);
        assert_eq!(c.position_at(7.0), c.offscreen);
    }

    #[test]
    fn test_enter_midpoint() {
        let c = curve(AnimationStyle::SlideLeft);
        assert_eq!(c.offscreen, Point2D::new(-500.0, 810.0));
        let mid = c.position_at(2.25);
        assert!((mid.x - (-80.0)).abs() < 1e-9);
        assert_eq!(mid.y, 810.0);
    }

    #[test]
    fn test_anchor_per_style() {
        assert_eq!(curve(AnimationStyle::SlideTop).offscreen.y, -400.0);
        assert_eq!(curve(AnimationStyle::SlideRight).offscreen.x, 1180.0);
        let fade = curve(AnimationStyle::Fade);
        assert_eq!(fade.offscreen, fade.center);
    }

    #[test]
    fn test_random_resolves_to_concrete() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let style = resolve_style(AnimationStyle::Random, &mut rng);
            assert!(!style.is_random());
        }
        assert_eq!(
            resolve_style(AnimationStyle::SlideTop, &mut rng),
            AnimationStyle::SlideTop
        );
    }

    #[test]
    fn test_keyframes_reproduce_curve() {
        let c = curve(AnimationStyle::SlideRight);
        let kf = c.keyframes();
        assert_eq!(kf.len(), 4);
        assert_eq!(kf[1], (2.5, c.center));
        assert_eq!(kf[2], (5.5, c.center));
    }

    #[test]
    fn test_zero_animation_holds_center() {
        let c = AnimationCurveBuilder::new(0.0).build(
            DisplayWindow::new(0.0, 2.0),
            AnimationStyle::SlideBottom,
            FRAME,
            Size::new(100, 100),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(c.position_at(0.0), c.center);
        assert_eq!(c.position_at(2.0), c.center);
        assert_eq!(c.position_at(3.0), c.offscreen);
        assert_eq!(c.keyframes().len(), 2);
    }
}
