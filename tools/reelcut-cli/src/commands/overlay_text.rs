//! Burn a one-line caption into a video.

use std::path::PathBuf;

use anyhow::Context;
use reelcut_common::config::AppConfig;
use reelcut_render_engine::export::Renderer;
use reelcut_render_engine::filters::CaptionStyle;
use reelcut_render_engine::overlay::overlay_caption;

use super::default_output;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    video: PathBuf,
    text: String,
    output: Option<PathBuf>,
    box_color: String,
    text_color: String,
    opacity: f64,
    dry_run: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| default_output(config, &video, "caption"));
    let style = CaptionStyle {
        box_color,
        text_color,
        box_opacity: opacity,
    };

    let renderer = Renderer::ffmpeg(&config.encoder);
    if !dry_run {
        anyhow::ensure!(renderer.is_available(), "ffmpeg not found in PATH");
    }

    println!("Adding caption to: {}", video.display());
    let plan = overlay_caption(
        &renderer,
        &video,
        &output,
        &text,
        &style,
        &config.engine,
        dry_run,
    )
    .await
    .context("Caption overlay failed")?;

    println!("  Text: {}", plan.text);
    println!("  Font size: {}", plan.layout.font_size);
    println!(
        "  Box: {}x{} at ({:.0}, {:.0})",
        plan.layout.box_width, plan.layout.box_height, plan.box_origin.x, plan.box_origin.y
    );

    if dry_run {
        println!("  Filter: {}", plan.filter);
    } else {
        println!("Caption complete: {}", output.display());
    }
    Ok(())
}
