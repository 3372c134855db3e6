//! Print an overlay display schedule without rendering.

use rand::rngs::StdRng;
use rand::SeedableRng;
use reelcut_common::config::{AppConfig, ResolutionPreset};
use reelcut_processing_core::animation::{max_item_size, AnimationCurveBuilder};
use reelcut_processing_core::overlay_scheduler::schedule_overlays;
use reelcut_project_model::geometry::Size;
use reelcut_project_model::overlay::AnimationStyle;
use reelcut_render_engine::compositor::{compute_overlay_frames, VerificationSummary};

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &AppConfig,
    count: usize,
    host_duration: f64,
    duration: Option<f64>,
    delay: f64,
    verify_fps: Option<u32>,
    resolution: ResolutionPreset,
    json: bool,
) -> anyhow::Result<()> {
    anyhow::ensure!(host_duration > 0.0, "Host duration must be positive");
    if let Some(d) = duration {
        anyhow::ensure!(d > 0.0, "Item duration must be positive");
    }

    let schedule = schedule_overlays(count, host_duration, duration, delay);

    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        println!("Overlay timing: {count} items over {host_duration:.2}s");
        println!(
            "  Per item: {:.3}s  Delay: {:.3}s  Total: {:.3}s",
            schedule.per_item_duration, schedule.delay, schedule.total_duration
        );
        for (i, w) in schedule.windows.iter().enumerate() {
            println!("  {:>4}  {:>8.3}s - {:>8.3}s", i + 1, w.start, w.end);
        }
    }

    if let Some(fps) = verify_fps {
        let (width, height) = resolution.dimensions();
        let frame = Size::new(width, height);
        let item = max_item_size(frame, config.engine.image_max_size_ratio);
        let builder = AnimationCurveBuilder::from(&config.engine);
        // Style does not affect visibility; fixed seed keeps output stable.
        let mut rng = StdRng::seed_from_u64(0);
        let layers: Vec<_> = schedule
            .windows
            .iter()
            .map(|w| (item, builder.build(*w, AnimationStyle::Fade, frame, item, &mut rng)))
            .collect();

        let frames = compute_overlay_frames(&layers, frame, fps, host_duration);
        let summary = VerificationSummary::from_frames(&frames, fps, host_duration);
        println!();
        println!(
            "  Verified {} frames at {fps}fps: {} with an overlay, {} shared",
            summary.frames_sampled, summary.frames_with_overlay, summary.overlapping_frames
        );
        if summary.is_clean(host_duration) {
            println!("  [OK] Schedule stays within the host");
        } else {
            println!("  [WARN] Items share frames at window boundaries");
        }
    }

    Ok(())
}
