//! Cut a video to the rhythm of an audio track.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use reelcut_audio_ai::{
    AudioWindow, CommandDetector, CutPointSource, TimestampDetector, TimestampFileDetector,
};
use reelcut_common::config::AppConfig;
use reelcut_processing_core::segment_planner::{PlannerConfig, SegmentPlanner};
use reelcut_project_model::cut_point::AnalysisMode;
use reelcut_project_model::timeline::OrderMode;
use reelcut_render_engine::command::RenderProgress;
use reelcut_render_engine::export::{FfmpegBackend, Renderer, TimelineJob};
use reelcut_render_engine::prepare::{prepare_sources, NormalizeOptions};
use reelcut_render_engine::probe::probe_duration;
use reelcut_render_engine::workspace::WorkDir;

use super::{default_output, make_rng};

pub struct GenerateArgs {
    pub video: PathBuf,
    pub audio: PathBuf,
    /// Joined after `video` before cutting.
    pub extra_videos: Vec<PathBuf>,
    pub normalize: bool,
    pub output: Option<PathBuf>,
    pub mode: AnalysisMode,
    pub interval: usize,
    pub order: OrderMode,
    pub audio_start: f64,
    pub audio_end: Option<f64>,
    pub detector: Option<PathBuf>,
    pub timestamps_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub dry_run: bool,
}

pub async fn run(config: &AppConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let mut videos = vec![args.video.clone()];
    videos.extend(args.extra_videos.iter().cloned());
    for path in videos.iter().chain([&args.audio]) {
        anyhow::ensure!(path.is_file(), "File not found: {}", path.display());
    }

    println!("Generating reel");
    for video in &videos {
        println!("  Video: {}", video.display());
    }
    println!("  Audio: {}", args.audio.display());
    println!("  Mode: {}  Interval: {}  Order: {}", args.mode, args.interval, args.order);

    let work = WorkDir::new_in(&config.paths.work_dir).context("Failed to create work directory")?;
    let backend = FfmpegBackend::from_config(&config.encoder).with_progress(Arc::new(
        |p: RenderProgress| {
            print!("\r  Progress: {:.1}% (ETA: {:.0}s)  ", p.progress * 100.0, p.eta_secs);
            std::io::stdout().flush().ok();
        },
    ));
    let renderer = Renderer::new(Box::new(backend), config.encoder.clone());

    let prepare = videos.len() > 1 || args.normalize;
    let (source_video, video_duration) = if prepare && !args.dry_run {
        anyhow::ensure!(renderer.is_available(), "ffmpeg not found in PATH");
        let opts = args
            .normalize
            .then(|| NormalizeOptions::from_config(&config.prepare, &config.encoder));
        let prepared = prepare_sources(&renderer, &videos, opts.as_ref(), &work, &work.file("source.mp4"))
            .await
            .context("Source preparation failed")?;
        println!();
        (prepared.path, prepared.info.duration)
    } else {
        // normalization keeps durations, so a dry run can sum them
        let mut total = 0.0;
        for video in &videos {
            total += probe_duration(video)
                .await
                .with_context(|| format!("Failed to probe {}", video.display()))?;
        }
        (args.video.clone(), total)
    };
    let audio_duration = probe_duration(&args.audio)
        .await
        .context("Failed to probe audio track")?;

    let window = AudioWindow::resolve(args.audio_start, args.audio_end, audio_duration)
        .with_context(|| {
            format!(
                "Audio window {}..{} is empty for a {audio_duration:.2}s track",
                args.audio_start,
                args.audio_end.map_or("end".to_string(), |e| e.to_string())
            )
        })?;
    println!(
        "  Audio window: {:.2}s - {:.2}s ({:.2}s)",
        window.start,
        window.end,
        window.duration()
    );

    let detector: Box<dyn TimestampDetector> = match (&args.detector, &args.timestamps_dir) {
        (Some(program), _) => Box::new(CommandDetector::new(program)),
        (None, Some(dir)) => Box::new(TimestampFileDetector::in_dir(dir)),
        (None, None) => Box::new(TimestampFileDetector::new()),
    };
    let source = Arc::new(CutPointSource::new(detector));
    let cut_points = {
        let source = Arc::clone(&source);
        let audio = args.audio.clone();
        let (mode, interval) = (args.mode, args.interval);
        tokio::task::spawn_blocking(move || source.cut_points(&audio, mode, Some(window), interval))
            .await
            .context("Cut point detection panicked")?
    };
    println!(
        "  Cut points: {} (detector: {})",
        cut_points.len(),
        source.detector_name()
    );

    let planner = SegmentPlanner::new(PlannerConfig::from(&config.engine));
    let mut rng = make_rng(args.seed);
    let timeline = planner.plan(
        video_duration,
        &cut_points,
        window.duration(),
        args.order,
        &mut rng,
    );
    anyhow::ensure!(
        !timeline.is_empty(),
        "Nothing to render: source is {video_duration:.2}s, target is {:.2}s",
        window.duration()
    );

    println!(
        "  Timeline: {} segments, {:.2}s of {:.2}s source",
        timeline.len(),
        timeline.total_duration(),
        video_duration
    );

    if args.dry_run {
        println!();
        println!("  {:>5}  {:>10}  {:>10}", "#", "offset", "duration");
        for seg in timeline.iter() {
            println!(
                "  {:>5}  {:>10.3}  {:>10.3}",
                seg.index, seg.source_start, seg.duration
            );
        }
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(config, &args.video, "reel"));
    println!("  Output: {}", output.display());

    anyhow::ensure!(renderer.is_available(), "ffmpeg not found in PATH");

    let job = TimelineJob {
        source_video,
        audio: args.audio,
        audio_start: window.start,
        timeline,
        output,
    };

    match renderer.render_timeline(&job, &work).await {
        Ok(path) => {
            println!("\nReel complete: {}", path.display());
            Ok(())
        }
        Err(e) => {
            println!("\nReel failed: {e}");
            Err(e.into())
        }
    }
}
