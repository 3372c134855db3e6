//! Animate a folder of images over a video.

use std::path::PathBuf;

use anyhow::Context;
use reelcut_common::config::AppConfig;
use reelcut_project_model::overlay::{AnimationStyle, OverlayContent};
use reelcut_render_engine::export::Renderer;
use reelcut_render_engine::overlay::{overlay_images, ImageOverlayRequest};

use super::{default_output, make_rng};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    video: PathBuf,
    images: PathBuf,
    output: Option<PathBuf>,
    duration: Option<f64>,
    delay: f64,
    style: AnimationStyle,
    seed: Option<u64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| default_output(config, &video, "images"));
    println!("Overlaying images");
    println!("  Video: {}", video.display());
    println!("  Images: {}", images.display());
    println!("  Style: {}", style.as_str());

    let request = ImageOverlayRequest {
        video,
        image_dir: images,
        output: output.clone(),
        per_item_duration: duration,
        delay,
        style,
    };

    let renderer = Renderer::ffmpeg(&config.encoder);
    if !dry_run {
        anyhow::ensure!(renderer.is_available(), "ffmpeg not found in PATH");
    }

    let mut rng = make_rng(seed);
    let plan = overlay_images(&renderer, &request, &config.engine, &mut rng, dry_run)
        .await
        .context("Image overlay failed")?;

    println!(
        "  {} images, {:.2}s each, delay {:.2}s, host {:.2}s",
        plan.items.len(),
        plan.schedule.per_item_duration,
        plan.schedule.delay,
        plan.host_duration
    );
    for (item, layer) in plan.items.iter().zip(&plan.layers) {
        let name = match &item.content {
            OverlayContent::Image { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            OverlayContent::Text { text } => text.clone(),
        };
        println!(
            "  {:>8.3}s - {:>8.3}s  {:<12} {:<10} {}",
            item.start(),
            item.end(),
            item.style.as_str(),
            layer.size,
            name
        );
    }

    if dry_run {
        if let Some(graph) = plan.filter_graph() {
            println!("\n  filter_complex:\n  {graph}");
        }
    } else {
        println!("Image overlay complete: {}", output.display());
    }
    Ok(())
}
