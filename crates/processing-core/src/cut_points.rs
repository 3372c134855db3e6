//! Cut-point post-processing: decimation and hybrid merging.

use reelcut_project_model::cut_point::{
    CutPoint, Timestamp, BEAT_WEIGHT, HYBRID_MIN_SPACING, VOCAL_WEIGHT,
};

/// Keep every `interval`-th cut point, starting with the first.
///
/// An interval of 0 is treated as 1.
pub fn decimate(points: &[Timestamp], interval: usize) -> Vec<Timestamp> {
    points.iter().copied().step_by(interval.max(1)).collect()
}

/// Merge beat and vocal streams into one ordered, de-duplicated sequence.
///
/// Points are tagged with their stream weight, stably sorted by time, and
/// scanned in order. A point survives only if it lies more than
/// [`HYBRID_MIN_SPACING`] after the last kept point. Weights are recorded
/// but never decide which of two close points survives: the earlier one
/// (or, on a tie, the beat) always wins.
pub fn merge_hybrid(beats: &[Timestamp], vocals: &[Timestamp]) -> Vec<CutPoint> {
    let mut all: Vec<CutPoint> = beats
        .iter()
        .map(|&t| CutPoint::new(t, BEAT_WEIGHT))
        .chain(vocals.iter().map(|&t| CutPoint::new(t, VOCAL_WEIGHT)))
        .collect();

    // sort_by is stable
    all.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut kept = Vec::with_capacity(all.len());
    let mut last = -1.0;
    for point in all {
        if point.time - last > HYBRID_MIN_SPACING {
            last = point.time;
            kept.push(point);
        }
    }

    tracing::debug!(
        beats = beats.len(),
        vocals = vocals.len(),
        merged = kept.len(),
        "Merged hybrid cut points"
    );
    kept
}

/// Clean raw detector output into a usable cut-point sequence.
///
/// Drops non-finite and negative values and sorts ascending.
pub fn sanitize(raw: Vec<f64>) -> Vec<Timestamp> {
    let mut points: Vec<Timestamp> = raw
        .into_iter()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .collect();
    points.sort_by(f64::total_cmp);
    points
}

/// Keep only the cut points inside `[start, end]`, rebased to `start`.
///
/// Used when generation runs on a window of the audio track.
pub fn window(points: &[Timestamp], start: f64, end: f64) -> Vec<Timestamp> {
    points
        .iter()
        .filter(|&&t| t >= start && t <= end)
        .map(|&t| t - start)
        .collect()
}
