//! Cut points produced by audio analysis.
//!
//! A cut point is a timestamp (seconds from the start of the track) at which
//! the edit should switch to a new excerpt. Sequences are non-decreasing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseNameError;

/// Seconds from the start of the audio track.
pub type Timestamp = f64;

/// Weight attached to beat onsets in hybrid mode.
pub const BEAT_WEIGHT: f64 = 0.7;

/// Weight attached to vocal onsets in hybrid mode.
pub const VOCAL_WEIGHT: f64 = 0.3;

/// Minimum spacing between two kept points after a hybrid merge (seconds).
pub const HYBRID_MIN_SPACING: f64 = 0.1;

/// Which musical events drive the cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Beat onsets.
    #[default]
    Beats,
    /// Vocal onsets.
    Vocals,
    /// Beats and vocals merged into one stream.
    Hybrid,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 3] = [Self::Beats, Self::Vocals, Self::Hybrid];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beats => "beats",
            Self::Vocals => "vocals",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beats" | "beat" => Ok(Self::Beats),
            "vocals" | "vocal" => Ok(Self::Vocals),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(ParseNameError {
                kind: "analysis mode",
                value: s.to_string(),
                expected: "beats, vocals, hybrid",
            }),
        }
    }
}

/// A weighted cut point.
///
/// The weight records which stream a point came from in hybrid mode. It is
/// carried through merging but never decides which point survives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutPoint {
    /// Seconds from the start of the track.
    pub time: Timestamp,
    /// Stream weight (1.0 for single-stream modes).
    pub weight: f64,
}

impl CutPoint {
    pub fn new(time: Timestamp, weight: f64) -> Self {
        Self { time, weight }
    }

    /// Unweighted point from a single-stream detector.
    pub fn unweighted(time: Timestamp) -> Self {
        Self::new(time, 1.0)
    }
}

/// Strip weights from a point list.
pub fn times_of(points: &[CutPoint]) -> Vec<Timestamp> {
    points.iter().map(|p| p.time).collect()
}
