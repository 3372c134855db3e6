//! Per-frame overlay sampling.
//!
//! Samples where each overlay sits on every output frame. Rendering itself
//! is done by the encoder from expressions; this gives the same answer in
//! Rust so schedules can be checked without encoding.

use reelcut_processing_core::animation::AnimationCurve;
use reelcut_project_model::geometry::{Point2D, Size};

/// One visible overlay on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlacement {
    /// Index of the overlay item.
    pub item: usize,
    /// Top-left corner in output pixels.
    pub position: Point2D,
    /// Whether any part of the item is inside the frame.
    pub on_screen: bool,
}

/// Overlays shown on a single output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOverlays {
    pub frame_index: u64,
    pub time_secs: f64,
    pub placements: Vec<OverlayPlacement>,
}

/// Sample every output frame of a `duration_secs` host at `fps`.
///
/// `layers` pairs each item's size with its curve. Frames with no visible
/// item are omitted.
pub fn compute_overlay_frames(
    layers: &[(Size, AnimationCurve)],
    frame: Size,
    fps: u32,
    duration_secs: f64,
) -> Vec<FrameOverlays> {
    if fps == 0 || !(duration_secs > 0.0) {
        return Vec::new();
    }
    let total_frames = (duration_secs * fps as f64).ceil() as u64;
    let mut frames = Vec::new();

    for frame_index in 0..total_frames {
        let time_secs = frame_index as f64 / fps as f64;
        let placements: Vec<OverlayPlacement> = layers
            .iter()
            .enumerate()
            .filter(|(_, (_, curve))| curve.is_visible(time_secs))
            .map(|(item, (size, curve))| {
                let position = curve.position_at(time_secs);
                OverlayPlacement {
                    item,
                    position,
                    on_screen: position.overlaps_frame(*size, frame),
                }
            })
            .collect();

        if !placements.is_empty() {
            frames.push(FrameOverlays {
                frame_index,
                time_secs,
                placements,
            });
        }
    }

    frames
}

/// Result of checking sampled frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationSummary {
    pub frames_sampled: u64,
    pub frames_with_overlay: usize,
    /// Frames where more than one item is visible.
    pub overlapping_frames: usize,
    /// Last time any item is visible.
    pub last_visible_secs: Option<f64>,
}

impl VerificationSummary {
    pub fn from_frames(frames: &[FrameOverlays], fps: u32, duration_secs: f64) -> Self {
        Self {
            frames_sampled: if fps == 0 {
                0
            } else {
                (duration_secs.max(0.0) * fps as f64).ceil() as u64
            },
            frames_with_overlay: frames.len(),
            overlapping_frames: frames.iter().filter(|f| f.placements.len() > 1).count(),
            last_visible_secs: frames.last().map(|f| f.time_secs),
        }
    }

    /// No overlap beyond shared window boundaries and nothing past the host.
    pub fn is_clean(&self, duration_secs: f64) -> bool {
        self.overlapping_frames == 0
            && self
                .last_visible_secs
                .map_or(true, |t| t <= duration_secs)
    }
}
