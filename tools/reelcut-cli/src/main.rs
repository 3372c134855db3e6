//! ReelCut CLI: beat-synced short videos from the command line.
//!
//! Usage:
//!   reelcut prepare <VIDEO>...                Normalize and join source videos
//!   reelcut generate <VIDEO> <AUDIO>          Cut a video to the beat of a track
//!   reelcut overlay-images <VIDEO> <DIR>      Animate a folder of images over a video
//!   reelcut overlay-text <VIDEO> <TEXT>       Burn a one-line caption into a video
//!   reelcut preview-timing                    Print an overlay schedule
//!   reelcut preview-text <TEXT>               Print a caption layout
//!   reelcut check                             Check external tools and config

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelcut_common::config::{AppConfig, CropMode, ResolutionPreset};
use reelcut_project_model::cut_point::AnalysisMode;
use reelcut_project_model::overlay::AnimationStyle;
use reelcut_project_model::timeline::OrderMode;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelcut",
    about = "Beat-synced short video generation with animated overlays",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/reelcut/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize source videos to one format and join them
    Prepare {
        /// Source videos, joined in the order given
        #[arg(required = true)]
        videos: Vec<PathBuf>,

        /// Output file (defaults to the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target frame: reels|shorts|story|landscape|square
        #[arg(long, value_parser = parse_resolution)]
        resolution: Option<ResolutionPreset>,

        /// Aspect handling: center|fit|stretch
        #[arg(long, value_parser = parse_crop)]
        crop: Option<CropMode>,

        /// Target frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Apply light denoising
        #[arg(long)]
        denoise: bool,

        /// Apply stabilization
        #[arg(long)]
        deshake: bool,

        /// Apply sharpening
        #[arg(long)]
        sharpen: bool,

        /// Join the videos as they are
        #[arg(long)]
        no_normalize: bool,
    },

    /// Cut a source video into segments timed to an audio track
    Generate {
        /// Source video
        video: PathBuf,

        /// Audio track
        audio: PathBuf,

        /// More source videos, joined after VIDEO before cutting
        #[arg(long = "add-video")]
        extra_videos: Vec<PathBuf>,

        /// Normalize sources with the configured settings before cutting
        #[arg(long)]
        normalize: bool,

        /// Output file (defaults to the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cut point analysis: beats|vocals|hybrid
        #[arg(long, default_value = "beats")]
        mode: AnalysisMode,

        /// Keep every Nth cut point
        #[arg(long, default_value = "1")]
        interval: usize,

        /// Segment order: sequential|random
        #[arg(long, default_value = "sequential")]
        order: OrderMode,

        /// Start of the audio window (seconds)
        #[arg(long, default_value = "0")]
        audio_start: f64,

        /// End of the audio window (seconds, defaults to the end of the track)
        #[arg(long)]
        audio_end: Option<f64>,

        /// External detector program, invoked as `<program> <mode> <audio>`
        #[arg(long)]
        detector: Option<PathBuf>,

        /// Folder holding precomputed `<audio>.<mode>.json` timestamps
        #[arg(long, conflicts_with = "detector")]
        timestamps_dir: Option<PathBuf>,

        /// Seed for segment offsets
        #[arg(long)]
        seed: Option<u64>,

        /// Print the timeline without rendering
        #[arg(long)]
        dry_run: bool,
    },

    /// Animate a folder of images over a video
    OverlayImages {
        /// Host video
        video: PathBuf,

        /// Folder of images (jpg, jpeg, png, webp, gif)
        images: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds each image is shown (derived from the video if omitted)
        #[arg(long)]
        duration: Option<f64>,

        /// Gap between images (seconds)
        #[arg(long, default_value = "0.5")]
        delay: f64,

        /// slide-bottom|slide-top|slide-left|slide-right|fade|random
        #[arg(long, default_value = "random")]
        style: AnimationStyle,

        /// Seed for random styles
        #[arg(long)]
        seed: Option<u64>,

        /// Print the plan without rendering
        #[arg(long)]
        dry_run: bool,
    },

    /// Burn a one-line caption at the bottom of a video
    OverlayText {
        /// Host video
        video: PathBuf,

        /// Caption text (at most 100 characters)
        text: String,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Box color: name, #RRGGBB or 0xRRGGBB
        #[arg(long, default_value = "black")]
        box_color: String,

        /// Text color: name, #RRGGBB or 0xRRGGBB
        #[arg(long, default_value = "white")]
        text_color: String,

        /// Box opacity [0.0, 1.0]
        #[arg(long, default_value = "0.7")]
        opacity: f64,

        /// Print the layout without rendering
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the display schedule for overlay items
    PreviewTiming {
        /// Number of items
        #[arg(long)]
        count: usize,

        /// Host video duration (seconds)
        #[arg(long)]
        host_duration: f64,

        /// Seconds per item (derived if omitted)
        #[arg(long)]
        duration: Option<f64>,

        /// Gap between items (seconds)
        #[arg(long, default_value = "0.5")]
        delay: f64,

        /// Sample frames at this rate to verify the schedule
        #[arg(long)]
        verify_fps: Option<u32>,

        /// Frame preset used for verification
        #[arg(long, default_value = "reels", value_parser = parse_resolution)]
        resolution: ResolutionPreset,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the caption layout for a frame
    PreviewText {
        /// Caption text
        text: String,

        /// Frame preset: reels|shorts|story|landscape|square
        #[arg(long, default_value = "reels", value_parser = parse_resolution)]
        resolution: ResolutionPreset,
    },

    /// Check external tools and configuration
    Check {
        /// Detector program to look for
        #[arg(long)]
        detector: Option<PathBuf>,
    },
}

fn parse_resolution(name: &str) -> Result<ResolutionPreset, String> {
    ResolutionPreset::parse(name)
        .ok_or_else(|| format!("unknown resolution '{name}': use reels, shorts, story, landscape or square"))
}

fn parse_crop(name: &str) -> Result<CropMode, String> {
    CropMode::parse(name).ok_or_else(|| format!("unknown crop mode '{name}': use center, fit or stretch"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reelcut_common::logging::init_logging(&config.logging);
    tracing::debug!(
        work_dir = %config.paths.work_dir.display(),
        output_dir = %config.paths.output_dir.display(),
        "Configuration loaded"
    );
    config.engine.validate()?;

    match cli.command {
        Commands::Prepare {
            videos,
            output,
            resolution,
            crop,
            fps,
            denoise,
            deshake,
            sharpen,
            no_normalize,
        } => {
            commands::prepare::run(
                &config,
                commands::prepare::PrepareArgs {
                    videos,
                    output,
                    resolution,
                    crop,
                    fps,
                    denoise,
                    deshake,
                    sharpen,
                    no_normalize,
                },
            )
            .await
        }
        Commands::Generate {
            video,
            audio,
            extra_videos,
            normalize,
            output,
            mode,
            interval,
            order,
            audio_start,
            audio_end,
            detector,
            timestamps_dir,
            seed,
            dry_run,
        } => {
            commands::generate::run(
                &config,
                commands::generate::GenerateArgs {
                    video,
                    audio,
                    extra_videos,
                    normalize,
                    output,
                    mode,
                    interval,
                    order,
                    audio_start,
                    audio_end,
                    detector,
                    timestamps_dir,
                    seed,
                    dry_run,
                },
            )
            .await
        }
        Commands::OverlayImages {
            video,
            images,
            output,
            duration,
            delay,
            style,
            seed,
            dry_run,
        } => {
            commands::overlay_images::run(
                &config, video, images, output, duration, delay, style, seed, dry_run,
            )
            .await
        }
        Commands::OverlayText {
            video,
            text,
            output,
            box_color,
            text_color,
            opacity,
            dry_run,
        } => {
            commands::overlay_text::run(
                &config, video, text, output, box_color, text_color, opacity, dry_run,
            )
            .await
        }
        Commands::PreviewTiming {
            count,
            host_duration,
            duration,
            delay,
            verify_fps,
            resolution,
            json,
        } => commands::preview_timing::run(
            &config,
            count,
            host_duration,
            duration,
            delay,
            verify_fps,
            resolution,
            json,
        ),
        Commands::PreviewText { text, resolution } => {
            commands::preview_text::run(&config, text, resolution)
        }
        Commands::Check { detector } => commands::check::run(&config, detector),
    }
}
