//! Cut-point source: detection, hybrid merging, decimation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use reelcut_processing_core::cut_points::{decimate, merge_hybrid, window};
use reelcut_project_model::cut_point::{times_of, AnalysisMode, CutPoint, Timestamp};

use crate::detector::TimestampDetector;

/// Portion of the audio track a generation run uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioWindow {
    pub start: f64,
    pub end: f64,
}

impl AudioWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Window covering `[start, end]` clamped to a track of `track_duration`.
    ///
    /// `end` of `None` means the end of the track. Returns `None` when the
    /// clamped window is empty.
    pub fn resolve(start: f64, end: Option<f64>, track_duration: f64) -> Option<Self> {
        let start = start.max(0.0);
        let end = end.unwrap_or(track_duration).min(track_duration);
        (end > start).then_some(Self { start, end })
    }

    /// Target length of the generated video.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Produces cut points for an audio file.
///
/// Results are cached per `(audio, mode)`: a cut-point set is computed once
/// and shared afterwards.
pub struct CutPointSource {
    detector: Box<dyn TimestampDetector>,
    cache: Mutex<HashMap<(PathBuf, AnalysisMode), Arc<Vec<CutPoint>>>>,
}

impl CutPointSource {
    pub fn new(detector: Box<dyn TimestampDetector>) -> Self {
        Self {
            detector,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Weighted cut points for `mode`, ascending. Empty on failure.
    pub fn detect(&self, audio_path: &Path, mode: AnalysisMode) -> Arc<Vec<CutPoint>> {
        let key = (audio_path.to_path_buf(), mode);
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return Arc::clone(hit);
            }
        }

        let points = match mode {
            AnalysisMode::Beats | AnalysisMode::Vocals => self
                .detector
                .detect(audio_path, mode)
                .into_iter()
                .map(CutPoint::unweighted)
                .collect(),
            AnalysisMode::Hybrid => {
                let beats = self.detector.detect(audio_path, AnalysisMode::Beats);
                let vocals = self.detector.detect(audio_path, AnalysisMode::Vocals);
                merge_hybrid(&beats, &vocals)
            }
        };

        if points.is_empty() {
            tracing::warn!(
                audio = %audio_path.display(),
                mode = %mode,
                "No cut points detected, planner will fall back"
            );
        }

        let points = Arc::new(points);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, Arc::clone(&points));
        }
        points
    }

    /// Cut-point times for one run: restricted to `audio_window` (rebased
    /// to its start) and decimated by `interval`.
    pub fn cut_points(
        &self,
        audio_path: &Path,
        mode: AnalysisMode,
        audio_window: Option<AudioWindow>,
        interval: usize,
    ) -> Vec<Timestamp> {
        let detected = self.detect(audio_path, mode);
        let times = times_of(&detected);
        let times = match audio_window {
            Some(w) => window(&times, w.start, w.end),
            None => times,
        };
        let decimated = decimate(&times, interval);
        tracing::debug!(
            detected = detected.len(),
            kept = decimated.len(),
            interval,
            "Prepared cut points"
        );
        decimated
    }
}
