//! Segment timeline for a generation run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseNameError;

/// How source offsets are chosen for consecutive segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    /// Walk through the source from the start, wrapping to 0 when the next
    /// excerpt would overrun it.
    #[default]
    Sequential,
    /// Draw every offset independently and uniformly.
    Random,
}

impl OrderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderMode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            _ => Err(ParseNameError {
                kind: "order mode",
                value: s.to_string(),
                expected: "sequential, random",
            }),
        }
    }
}

/// One contiguous excerpt of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the timeline (0-based).
    pub index: usize,
    /// Offset into the source video (seconds).
    pub source_start: f64,
    /// Length of the excerpt (seconds).
    pub duration: f64,
}

impl Segment {
    pub fn new(index: usize, source_start: f64, duration: f64) -> Self {
        Self {
            index,
            source_start,
            duration,
        }
    }

    /// Offset of the excerpt's last instant in the source.
    pub fn source_end(&self) -> f64 {
        self.source_start + self.duration
    }
}

/// Ordered excerpts whose durations add up to the target length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub segments: Vec<Segment>,

    /// Duration of the source video the excerpts were taken from.
    pub source_duration: f64,

    /// Length the timeline was planned to fill.
    pub target_duration: f64,
}

impl Timeline {
    pub fn new(source_duration: f64, target_duration: f64) -> Self {
        Self {
            segments: Vec::new(),
            source_duration,
            target_duration,
        }
    }

    /// Sum of all segment durations.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Whether every excerpt lies inside the source.
    pub fn within_source(&self) -> bool {
        self.segments
            .iter()
            .all(|s| s.source_start >= 0.0 && s.source_end() <= self.source_duration + 1e-9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_duration() {
        let mut tl = Timeline::new(10.0, 6.0);
        tl.segments.push(Segment::new(0, 0.0, 2.0));
        tl.segments.push(Segment::new(1, 2.0, 3.0));
        tl.segments.push(Segment::new(2, 5.0, 1.0));
        assert!((tl.total_duration() - 6.0).abs() < 1e-9);
        assert_eq!(tl.len(), 3);
        assert!(tl.within_source());
    }

    #[test]
    fn test_within_source_detects_overrun() {
        let mut tl = Timeline::new(4.0, 5.0);
        tl.segments.push(Segment::new(0, 3.0, 2.0));
        assert!(!tl.within_source());
    }

    #[test]
    fn test_order_mode_parse() {
        assert_eq!("Random".parse::<OrderMode>(), Ok(OrderMode::Random));
        assert!("shuffled".parse::<OrderMode>().is_err());
    }

    #[test]
    fn test_timeline_serde_roundtrip() {
        let mut tl = Timeline::new(8.0, 3.0);
        tl.segments.push(Segment::new(0, 1.5, 3.0));
        let json = serde_json::to_string(&tl).unwrap();
        let back: Timeline = serde_json::from_str(&json).unwrap();
        assert_eq!(tl, back);
    }
}
