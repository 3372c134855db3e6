//! Overlay display scheduling.
//!
//! Lays out `n` consecutive display windows over a host video, separated by
//! a fixed delay. If the schedule would run past the end of the host, every
//! time is scaled down by the same factor so the last window ends exactly at
//! the host's end.

use reelcut_project_model::overlay::{DisplayWindow, OverlaySchedule};

/// Shortest per-item duration chosen when the duration is derived
/// automatically (seconds).
pub const MIN_AUTO_ITEM_DURATION: f64 = 1.0;

/// Compute display windows for `item_count` overlay items.
///
/// `per_item_duration` of `None` derives a duration that fills the host.
/// Never fails: zero items or a non-positive host produce an empty schedule.
pub fn schedule_overlays(
    item_count: usize,
    host_duration: f64,
    per_item_duration: Option<f64>,
    inter_item_delay: f64,
) -> OverlaySchedule {
    if item_count == 0 || !(host_duration > 0.0) {
        return OverlaySchedule::default();
    }

    let mut delay = inter_item_delay.max(0.0);
    let per_item = match per_item_duration {
        Some(d) => d,
        None => {
            let mut available = host_duration - delay * (item_count - 1) as f64;
            if available <= 0.0 {
                tracing::debug!(delay, host_duration, "Host too short for delays, dropping them");
                delay = 0.0;
                available = host_duration;
            }
            (available / item_count as f64).max(MIN_AUTO_ITEM_DURATION)
        }
    };

    let mut windows = Vec::with_capacity(item_count);
    let mut cursor = 0.0;
    for i in 0..item_count {
        let start = cursor;
        let end = start + per_item;
        windows.push(DisplayWindow::new(start, end));
        cursor = end;
        if i + 1 < item_count {
            cursor += delay;
        }
    }

    let last_end = cursor;
    let mut schedule = OverlaySchedule {
        per_item_duration: per_item,
        delay,
        windows,
        total_duration: last_end,
    };

    if last_end > host_duration {
        let factor = host_duration / last_end;
        tracing::debug!(factor, "Schedule exceeds host duration, rescaling");
        for w in &mut schedule.windows {
            w.start *= factor;
            w.end *= factor;
        }
        if let Some(last) = schedule.windows.last_mut() {
            last.end = host_duration;
        }
        schedule.per_item_duration *= factor;
        schedule.delay *= factor;
        schedule.total_duration = host_duration;
    }

    schedule
}
