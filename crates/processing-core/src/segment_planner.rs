//! Segment planning.
//!
//! Turns cut points and a target duration into an ordered [`Timeline`] of
//! source-video excerpts. Planning never fails: when the cut points are
//! unusable the planner falls back to a single excerpt.

use rand::Rng;
use reelcut_common::config::EngineConfig;
use reelcut_project_model::cut_point::Timestamp;
use reelcut_project_model::timeline::{OrderMode, Segment, Timeline};

/// Configuration for the segment planner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Candidates shorter than this are discarded (seconds).
    pub min_segment_duration: f64,

    /// Carried for configuration parity; not enforced.
    pub max_segment_duration: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_segment_duration: 0.3,
            max_segment_duration: 5.0,
        }
    }
}

impl From<&EngineConfig> for PlannerConfig {
    fn from(engine: &EngineConfig) -> Self {
        Self {
            min_segment_duration: engine.min_segment_duration,
            max_segment_duration: engine.max_segment_duration,
        }
    }
}

/// Builds a [`Timeline`] from cut points.
pub struct SegmentPlanner {
    config: PlannerConfig,
}

impl SegmentPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(PlannerConfig::default())
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Excerpt durations derived from cut points, before any fallback.
    ///
    /// Consecutive deltas shorter than the minimum are dropped. If the rest
    /// falls short of `target_duration` by more than the minimum, one filler
    /// duration covering the shortfall is appended. Returns an empty list
    /// when no delta is usable.
    pub fn candidate_durations(&self, cut_points: &[Timestamp], target_duration: f64) -> Vec<f64> {
        let min = self.config.min_segment_duration;

        let mut durations: Vec<f64> = cut_points
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|d| *d >= min)
            .collect();

        if durations.is_empty() {
            return durations;
        }

        let total: f64 = durations.iter().sum();
        let shortfall = target_duration - total;
        if shortfall > min {
            tracing::debug!(shortfall, "Appending filler segment");
            durations.push(shortfall);
        }

        durations
    }

    /// Plan the excerpts for one generation run.
    ///
    /// `rng` is only consulted in [`OrderMode::Random`].
    pub fn plan<R: Rng + ?Sized>(
        &self,
        source_duration: f64,
        cut_points: &[Timestamp],
        target_duration: f64,
        order: OrderMode,
        rng: &mut R,
    ) -> Timeline {
        let mut timeline = Timeline::new(source_duration, target_duration);

        if !(source_duration > 0.0) || !(target_duration > 0.0) {
            tracing::warn!(
                source_duration,
                target_duration,
                "Nothing to plan: source or target duration is not positive"
            );
            return timeline;
        }

        let min = self.config.min_segment_duration;
        let fallback = target_duration.min(source_duration);

        let mut durations = self.candidate_durations(cut_points, target_duration);
        if durations.is_empty() {
            tracing::info!(
                cut_points = cut_points.len(),
                fallback,
                "No usable cut points, using a single segment"
            );
            durations.push(fallback);
        } else if source_duration < min {
            tracing::info!(
                source_duration,
                min,
                fallback,
                "Source shorter than the minimum segment, using a single segment"
            );
            durations = vec![fallback];
        }

        let durations = split_to_fit(durations, source_duration, min);

        let mut cursor = 0.0;
        for (index, duration) in durations.into_iter().enumerate() {
            let source_start = match order {
                OrderMode::Sequential => {
                    if cursor + duration > source_duration {
                        cursor = 0.0;
                    }
                    let start = cursor;
                    cursor += duration;
                    start
                }
                OrderMode::Random => {
                    let max_start = source_duration - duration;
                    if max_start > 0.0 {
                        rng.gen_range(0.0..=max_start)
                    } else {
                        0.0
                    }
                }
            };
            timeline
                .segments
                .push(Segment::new(index, source_start, duration));
        }

        tracing::info!(
            segments = timeline.len(),
            total = timeline.total_duration(),
            target = target_duration,
            order = %order,
            "Planned timeline"
        );
        timeline
    }
}

/// Split any duration longer than the source into pieces that fit.
///
/// Pieces are equal when that keeps them at or above `min`. Otherwise the
/// duration becomes whole-source pieces plus the remainder, which is
/// dropped when it is shorter than `min`. Expects `source_duration >= min`.
fn split_to_fit(durations: Vec<f64>, source_duration: f64, min: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(durations.len());
    for duration in durations {
        if duration <= source_duration {
            out.push(duration);
            continue;
        }
        let parts = (duration / source_duration).ceil().max(1.0) as usize;
        let piece = (duration / parts as f64).min(source_duration);
        if piece >= min {
            tracing::warn!(
                duration,
                source_duration,
                parts,
                "Segment longer than source, splitting"
            );
            out.extend(std::iter::repeat(piece).take(parts));
            continue;
        }

        let whole = (duration / source_duration).floor().max(1.0) as usize;
        let remainder = duration - whole as f64 * source_duration;
        tracing::warn!(
            duration,
            source_duration,
            whole,
            remainder,
            "Segment longer than source, splitting into whole-source pieces"
        );
        out.extend(std::iter::repeat(source_duration).take(whole));
        if remainder >= min {
            out.push(remainder);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_candidates_filter_short_deltas() {
        let planner = SegmentPlanner::with_defaults();
        let d = planner.candidate_durations(&[0.0, 0.1, 1.0, 1.2, 2.0], 1.5);
        // 0.1 and 0.2 dropped; 0.9 and 0.8 kept; total 1.7 >= 1.5 so no filler
        assert_eq!(d.len(), 2);
        assert!((d[0] - 0.9).abs() < 1e-9);
        assert!((d[1] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_at_minimum_is_kept() {
        let planner = SegmentPlanner::with_defaults();
        let d = planner.candidate_durations(&[0.0, 0.3], 0.3);
        assert_eq!(d, vec![0.3]);
    }

    #[test]
    fn test_small_shortfall_gets_no_filler() {
        let planner = SegmentPlanner::with_defaults();
        let d = planner.candidate_durations(&[0.0, 2.0], 2.2);
        assert_eq!(d, vec![2.0]);
    }

    #[test]
    fn test_filler_appended() {
        let planner = SegmentPlanner::with_defaults();
        let d = planner.candidate_durations(&[0.0, 2.0, 5.0], 6.0);
        assert_eq!(d, vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_fallback_single_segment() {
        let planner = SegmentPlanner::with_defaults();
        let tl = planner.plan(4.0, &[], 10.0, OrderMode::Sequential, &mut rng());
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.segments[0], Segment::new(0, 0.0, 4.0));
    }

    #[test]
    fn test_fallback_uses_target_when_shorter() {
        let planner = SegmentPlanner::with_defaults();
        let tl = planner.plan(30.0, &[1.0], 12.0, OrderMode::Random, &mut rng());
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.segments[0].duration, 12.0);
    }

    #[test]
    fn test_sequential_wraps_to_zero() {
        let planner = SegmentPlanner::with_defaults();
        let tl = planner.plan(5.0, &[0.0, 2.0, 4.0, 6.0], 6.0, OrderMode::Sequential, &mut rng());
        let starts: Vec<f64> = tl.iter().map(|s| s.source_start).collect();
        assert_eq!(starts, vec![0.0, 2.0, 0.0]);
        assert!(tl.within_source());
    }

    #[test]
    fn test_random_offsets_stay_inside_source() {
        let planner = SegmentPlanner::with_defaults();
        let cuts: Vec<f64> = (0..20).map(|i| i as f64 * 0.75).collect();
        let tl = planner.plan(6.0, &cuts, 14.0, OrderMode::Random, &mut rng());
        assert!(!tl.is_empty());
        assert!(tl.within_source());
    }

    #[test]
    fn test_random_is_deterministic_for_seed() {
        let planner = SegmentPlanner::with_defaults();
        let cuts = [0.0, 1.0, 2.5, 4.0];
        let a = planner.plan(20.0, &cuts, 4.0, OrderMode::Random, &mut StdRng::seed_from_u64(42));
        let b = planner.plan(20.0, &cuts, 4.0, OrderMode::Random, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_overlong_filler_is_split() {
        let planner = SegmentPlanner::with_defaults();
        // candidates [1.0], filler 9.0 against a 4s source -> 3 parts of 3.0
        let tl = planner.plan(4.0, &[0.0, 1.0], 10.0, OrderMode::Sequential, &mut rng());
        let durations: Vec<f64> = tl.iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![1.0, 3.0, 3.0, 3.0]);
        assert!(tl.within_source());
        assert!((tl.total_duration() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_never_drops_below_minimum() {
        let planner = SegmentPlanner::with_defaults();
        // equal halves would be 0.275; one whole-source piece instead
        let tl = planner.plan(0.5, &[0.0, 0.55], 0.55, OrderMode::Sequential, &mut rng());
        let durations: Vec<f64> = tl.iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![0.5]);
        assert!(tl.within_source());
    }

    #[test]
    fn test_split_into_equal_pieces_on_short_source() {
        let planner = SegmentPlanner::with_defaults();
        // 0.7 over a 0.4 source: halves of 0.35 clear the minimum
        let tl = planner.plan(0.4, &[0.0, 0.7], 0.7, OrderMode::Random, &mut rng());
        let durations: Vec<f64> = tl.iter().map(|s| s.duration).collect();
        assert_eq!(durations.len(), 2);
        assert!(durations.iter().all(|d| (d - 0.35).abs() < 1e-9));
        assert!(tl.within_source());
    }

    #[test]
    fn test_split_drops_short_remainder() {
        let planner = SegmentPlanner::with_defaults();
        // 0.72 over a 0.35 source: thirds of 0.24 are too short
        let tl = planner.plan(0.35, &[0.0, 0.72], 0.72, OrderMode::Sequential, &mut rng());
        let durations: Vec<f64> = tl.iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![0.35, 0.35]);
    }

    #[test]
    fn test_source_below_minimum_uses_single_segment() {
        let planner = SegmentPlanner::with_defaults();
        let tl = planner.plan(0.2, &[0.0, 1.0, 2.0], 2.0, OrderMode::Sequential, &mut rng());
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.segments[0], Segment::new(0, 0.0, 0.2));
    }

    #[test]
    fn test_non_positive_source_yields_empty_timeline() {
        let planner = SegmentPlanner::with_defaults();
        let tl = planner.plan(0.0, &[0.0, 1.0], 5.0, OrderMode::Sequential, &mut rng());
        assert!(tl.is_empty());
    }

    #[test]
    fn test_indices_are_sequential() {
        let planner = SegmentPlanner::with_defaults();
        let tl = planner.plan(10.0, &[0.0, 1.0, 2.0, 3.0], 3.0, OrderMode::Sequential, &mut rng());
        for (i, seg) in tl.iter().enumerate() {
            assert_eq!(seg.index, i);
        }
    }
}
