//! Normalize and join source videos into one cuttable source.

use std::path::PathBuf;

use anyhow::Context;
use reelcut_common::config::{AppConfig, CropMode, ResolutionPreset};
use reelcut_render_engine::export::Renderer;
use reelcut_render_engine::prepare::{prepare_sources, NormalizeOptions};
use reelcut_render_engine::workspace::WorkDir;

use super::default_output;

pub struct PrepareArgs {
    pub videos: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub resolution: Option<ResolutionPreset>,
    pub crop: Option<CropMode>,
    pub fps: Option<u32>,
    pub denoise: bool,
    pub deshake: bool,
    pub sharpen: bool,
    pub no_normalize: bool,
}

impl PrepareArgs {
    /// Config settings with command line overrides applied.
    fn normalize_options(&self, config: &AppConfig) -> Option<NormalizeOptions> {
        if self.no_normalize {
            return None;
        }
        let mut prepare = config.prepare.clone();
        if let Some(resolution) = self.resolution {
            prepare.resolution = resolution;
        }
        if let Some(crop) = self.crop {
            prepare.crop = crop;
        }
        prepare.denoise |= self.denoise;
        prepare.deshake |= self.deshake;
        prepare.sharpen |= self.sharpen;

        let mut opts = NormalizeOptions::from_config(&prepare, &config.encoder);
        if let Some(fps) = self.fps {
            opts.fps = fps;
        }
        Some(opts)
    }
}

pub async fn run(config: &AppConfig, args: PrepareArgs) -> anyhow::Result<()> {
    anyhow::ensure!(!args.videos.is_empty(), "No source videos given");
    if let Some(fps) = args.fps {
        anyhow::ensure!(fps > 0, "--fps must be positive");
    }

    let opts = args.normalize_options(config);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(config, &args.videos[0], "prepared"));

    println!("Preparing {} source video(s)", args.videos.len());
    for video in &args.videos {
        println!("  {}", video.display());
    }
    match &opts {
        Some(o) => println!(
            "  Normalize: {}x{} @ {}fps, crop {}",
            o.target.width,
            o.target.height,
            o.fps,
            o.crop.as_str()
        ),
        None => println!("  Normalize: off"),
    }

    let renderer = Renderer::ffmpeg(&config.encoder);
    anyhow::ensure!(renderer.is_available(), "ffmpeg not found in PATH");
    let work = WorkDir::new_in(&config.paths.work_dir).context("Failed to create work directory")?;

    let prepared = prepare_sources(&renderer, &args.videos, opts.as_ref(), &work, &output)
        .await
        .context("Source preparation failed")?;

    println!(
        "Source ready: {} ({:.2}s, {}x{})",
        prepared.path.display(),
        prepared.info.duration,
        prepared.info.width,
        prepared.info.height
    );
    Ok(())
}
