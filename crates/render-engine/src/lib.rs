//! ReelCut Render Engine
//!
//! The ffmpeg boundary. Turns editing decisions into media files:
//!
//! ```text
//! videos ───────── normalize ── combine ── source.mp4
//!
//! Timeline ──────── segment extraction ── concat ── audio mux ── reel.mp4
//!
//! reel.mp4 ─┬─ images + schedule + curves ── filter_complex ── overlaid.mp4
//!           └─ caption + layout ──────────── drawbox/drawtext ── captioned.mp4
//! ```
//!
//! Position curves stay pure in `reelcut-processing-core`; this crate is
//! the only place they become encoder expressions.

pub mod command;
pub mod compositor;
pub mod export;
pub mod expr;
pub mod filters;
pub mod overlay;
pub mod prepare;
pub mod probe;
pub mod workspace;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner, RenderProgress};
pub use export::{FfmpegBackend, RenderBackend, Renderer, TimelineJob};
pub use filters::CaptionStyle;
pub use overlay::{ImageOverlayRequest, ImageOverlayPlan, CaptionPlan};
pub use prepare::{NormalizeOptions, PreparedSource};
pub use probe::{probe_media, MediaInfo};
pub use workspace::WorkDir;
