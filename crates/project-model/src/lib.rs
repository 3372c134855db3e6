//! ReelCut Project Model
//!
//! Defines the core data contracts shared by every ReelCut crate:
//! - **Cut points:** Timestamps of musically salient events and the analysis
//!   mode that produced them
//! - **Timeline:** Ordered source-video excerpts for one generation run
//! - **Overlays:** Overlay items, display windows, schedules, and layout
//! - **Geometry:** Pixel sizes and positions in output-frame space
//!
//! All times are seconds as `f64`. All geometry is in output pixels.

pub mod cut_point;
pub mod geometry;
pub mod overlay;
pub mod timeline;

pub use cut_point::*;
pub use geometry::*;
pub use overlay::*;
pub use timeline::*;

/// Error returned when parsing a model enum from its textual name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}
