//! Print a caption layout without rendering.

use reelcut_common::config::{AppConfig, ResolutionPreset};
use reelcut_project_model::geometry::Size;
use reelcut_render_engine::filters::CaptionStyle;
use reelcut_render_engine::overlay::plan_caption;

pub fn run(config: &AppConfig, text: String, resolution: ResolutionPreset) -> anyhow::Result<()> {
    let (width, height) = resolution.dimensions();
    let frame = Size::new(width, height);
    let plan = plan_caption(&text, frame, &config.engine, &CaptionStyle::default())?;

    println!("Caption layout for {frame} ({resolution:?})");
    println!("  Text: {} ({} chars)", plan.text, plan.text.chars().count());
    println!("  Font size: {}", plan.layout.font_size);
    println!(
        "  Box: {}x{} at ({:.0}, {:.0})",
        plan.layout.box_width, plan.layout.box_height, plan.box_origin.x, plan.box_origin.y
    );
    if plan.layout.box_width > width {
        println!("  [WARN] Box is wider than the frame; text hits the minimum font size");
    }
    Ok(())
}
