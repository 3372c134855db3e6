//! ReelCut Processing Core
//!
//! Turns analysis results and layout parameters into editing decisions:
//! - **Cut points:** Decimation and hybrid beat/vocal merging
//! - **Segment planning:** Ordered source excerpts that fill the audio
//! - **Overlay scheduling:** Non-overlapping display windows over the host
//! - **Animation:** Item sizing and enter/hold/exit position curves
//! - **Text layout:** One-line caption font and box sizing
//!
//! This crate is pure computation: no I/O, no encoder. Randomness is always
//! drawn from a caller-supplied generator.

pub mod animation;
pub mod cut_points;
pub mod overlay_scheduler;
pub mod segment_planner;
pub mod text_layout;

pub use animation::{AnimationCurve, AnimationCurveBuilder};
pub use overlay_scheduler::schedule_overlays;
pub use segment_planner::{PlannerConfig, SegmentPlanner};
pub use text_layout::{TextLayoutConfig, TextLayoutEngine};
