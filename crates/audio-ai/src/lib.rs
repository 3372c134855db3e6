//! ReelCut Audio Analysis
//!
//! Turns an audio track into cut points:
//! - **Detectors:** Adapters over external beat/vocal onset extraction
//! - **Cut-point source:** Hybrid merging, audio windows, and decimation

pub mod cut_source;
pub mod detector;

pub use cut_source::*;
pub use detector::*;
