//! Image and caption overlay runs on an existing video.

use std::path::{Path, PathBuf};

use rand::Rng;
use reelcut_common::config::EngineConfig;
use reelcut_common::error::{ReelError, ReelResult};
use reelcut_processing_core::animation::{fit_item_size, max_item_size, AnimationCurveBuilder};
use reelcut_processing_core::overlay_scheduler::schedule_overlays;
use reelcut_processing_core::text_layout::{TextLayoutConfig, TextLayoutEngine};
use reelcut_project_model::geometry::{Point2D, Size};
use reelcut_project_model::overlay::{
    AnimationStyle, OverlayContent, OverlayItem, OverlaySchedule, TextLayout,
};

use crate::command::FfmpegCommand;
use crate::export::Renderer;
use crate::filters::{build_caption_filter, build_image_overlay_graph, CaptionStyle, ImageLayer};
use crate::probe::{probe_dimensions, probe_media};

/// Image extensions picked up from an overlay folder.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Shortest explicit per-image duration accepted.
pub const MIN_ITEM_DURATION: f64 = 0.1;

/// Longest caption accepted, in characters.
pub const MAX_CAPTION_CHARS: usize = 100;

/// Request to overlay a folder of images onto a video.
#[derive(Debug, Clone)]
pub struct ImageOverlayRequest {
    pub video: PathBuf,
    pub image_dir: PathBuf,
    pub output: PathBuf,
    /// Fixed seconds per image; `None` spreads images over the video.
    pub per_item_duration: Option<f64>,
    pub delay: f64,
    pub style: AnimationStyle,
}

impl ImageOverlayRequest {
    /// Check inputs and return the images to overlay.
    pub fn validate(&self) -> ReelResult<Vec<PathBuf>> {
        if !self.video.is_file() {
            return Err(ReelError::overlay_input(format!(
                "video not found: {}",
                self.video.display()
            )));
        }
        if !self.image_dir.exists() {
            return Err(ReelError::overlay_input(format!(
                "image folder not found: {}",
                self.image_dir.display()
            )));
        }
        if !self.image_dir.is_dir() {
            return Err(ReelError::overlay_input(format!(
                "not a folder: {}",
                self.image_dir.display()
            )));
        }
        if let Some(d) = self.per_item_duration {
            if d <= 0.0 {
                return Err(ReelError::overlay_input("duration per image must be positive"));
            }
            if d < MIN_ITEM_DURATION {
                return Err(ReelError::overlay_input(format!(
                    "duration per image must be at least {MIN_ITEM_DURATION}s"
                )));
            }
        }

        let images = load_images(&self.image_dir)?;
        if images.is_empty() {
            return Err(ReelError::overlay_input(format!(
                "no images ({}) in {}",
                IMAGE_EXTENSIONS.join(", "),
                self.image_dir.display()
            )));
        }
        Ok(images)
    }
}

/// Image files in `dir`, sorted by name.
pub fn load_images(dir: &Path) -> ReelResult<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Everything needed to render an image overlay.
#[derive(Debug, Clone)]
pub struct ImageOverlayPlan {
    pub frame: Size,
    pub host_duration: f64,
    pub schedule: OverlaySchedule,
    pub items: Vec<OverlayItem>,
    pub layers: Vec<ImageLayer>,
}

impl ImageOverlayPlan {
    pub fn filter_graph(&self) -> Option<String> {
        build_image_overlay_graph(&self.layers)
    }
}

/// Schedule, size and animate `images` (path and native size) over a host.
pub fn plan_image_overlays<R: Rng + ?Sized>(
    images: &[(PathBuf, Size)],
    frame: Size,
    host_duration: f64,
    per_item_duration: Option<f64>,
    delay: f64,
    style: AnimationStyle,
    engine: &EngineConfig,
    rng: &mut R,
) -> ImageOverlayPlan {
    let schedule = schedule_overlays(images.len(), host_duration, per_item_duration, delay);
    let curves = AnimationCurveBuilder::from(engine);

    let mut items = Vec::with_capacity(images.len());
    let mut layers = Vec::with_capacity(images.len());
    for ((path, native), window) in images.iter().zip(&schedule.windows) {
        let size = fit_item_size(*native, frame, engine.image_max_size_ratio);
        let curve = curves.build(*window, style, frame, size, rng);
        items.push(OverlayItem {
            content: OverlayContent::Image { path: path.clone() },
            window: *window,
            style: curve.style,
        });
        layers.push(ImageLayer { size, curve });
    }

    ImageOverlayPlan {
        frame,
        host_duration,
        schedule,
        items,
        layers,
    }
}

/// Validate, plan and render an image overlay.
///
/// With `dry_run` set nothing is encoded.
pub async fn overlay_images<R: Rng + ?Sized>(
    renderer: &Renderer,
    request: &ImageOverlayRequest,
    engine: &EngineConfig,
    rng: &mut R,
    dry_run: bool,
) -> ReelResult<ImageOverlayPlan> {
    let images = request.validate()?;
    let info = probe_media(&request.video).await?;
    if !info.has_video() {
        return Err(ReelError::overlay_input(format!(
            "{} has no video stream",
            request.video.display()
        )));
    }
    let frame = info.size();
    let fallback = max_item_size(frame, engine.image_max_size_ratio);

    let mut sized = Vec::with_capacity(images.len());
    for path in images {
        let size = match probe_dimensions(&path).await {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(image = %path.display(), error = %e, "Could not size image, using maximum");
                fallback
            }
        };
        sized.push((path, size));
    }

    let plan = plan_image_overlays(
        &sized,
        frame,
        info.duration,
        request.per_item_duration,
        request.delay,
        request.style,
        engine,
        rng,
    );
    tracing::info!(
        images = plan.items.len(),
        per_item = plan.schedule.per_item_duration,
        total = plan.schedule.total_duration,
        host = info.duration,
        "Planned image overlay"
    );

    if dry_run {
        return Ok(plan);
    }

    let Some(graph) = plan.filter_graph() else {
        return Err(ReelError::overlay_input("nothing to overlay"));
    };
    let encoder = renderer.encoder();
    let mut cmd = FfmpegCommand::new(&request.output).input(&request.video);
    for (path, _) in &sized {
        cmd = cmd.input_with(["-loop", "1"], path);
    }
    let cmd = cmd
        .filter_complex(graph)
        .encode_video(encoder, &encoder.preset)
        .audio_codec("copy")
        .faststart()
        .shortest()
        .log_level(encoder.loglevel.clone());

    renderer.run(&cmd, info.duration).await?;
    tracing::info!(output = %request.output.display(), "Image overlay complete");
    Ok(plan)
}

/// Trimmed caption text, or an error if empty or too long.
pub fn validate_caption_text(text: &str) -> ReelResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ReelError::overlay_input("caption text is empty"));
    }
    let chars = text.chars().count();
    if chars > MAX_CAPTION_CHARS {
        return Err(ReelError::overlay_input(format!(
            "caption is {chars} characters, limit is {MAX_CAPTION_CHARS}"
        )));
    }
    Ok(text.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionPlan {
    pub text: String,
    pub layout: TextLayout,
    /// Top-left corner of the background box.
    pub box_origin: Point2D,
    pub filter: String,
}

pub fn plan_caption(
    text: &str,
    frame: Size,
    engine: &EngineConfig,
    style: &CaptionStyle,
) -> ReelResult<CaptionPlan> {
    let text = validate_caption_text(text)?;
    let layout_engine = TextLayoutEngine::new(TextLayoutConfig::from(engine));
    let layout = layout_engine.layout(&text, frame.width);
    if !layout_engine.fits(&layout, frame) {
        tracing::warn!(
            box_width = layout.box_width,
            frame = %frame,
            "Caption box is wider than the frame"
        );
    }
    let filter = build_caption_filter(&text, &layout, engine.text_bottom_margin, style);
    Ok(CaptionPlan {
        box_origin: layout_engine.box_origin(&layout, frame),
        text,
        layout,
        filter,
    })
}

/// Burn a one-line caption into `video`.
pub async fn overlay_caption(
    renderer: &Renderer,
    video: &Path,
    output: &Path,
    text: &str,
    style: &CaptionStyle,
    engine: &EngineConfig,
    dry_run: bool,
) -> ReelResult<CaptionPlan> {
    let text = validate_caption_text(text)?;
    if !video.is_file() {
        return Err(ReelError::overlay_input(format!(
            "video not found: {}",
            video.display()
        )));
    }
    let info = probe_media(video).await?;
    let plan = plan_caption(&text, info.size(), engine, style)?;
    tracing::info!(
        font_size = plan.layout.font_size,
        box_width = plan.layout.box_width,
        box_height = plan.layout.box_height,
        "Planned caption"
    );

    if dry_run {
        return Ok(plan);
    }

    let encoder = renderer.encoder();
    let cmd = FfmpegCommand::new(output)
        .input(video)
        .video_filter(plan.filter.clone())
        .encode_video(encoder, &encoder.preset)
        .audio_codec("copy")
        .faststart()
        .log_level(encoder.loglevel.clone());
    renderer.run(&cmd, info.duration).await?;
    tracing::info!(output = %output.display(), "Caption overlay complete");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn request(dir: &Path) -> ImageOverlayRequest {
        ImageOverlayRequest {
            video: dir.join("host.mp4"),
            image_dir: dir.join("images"),
            output: dir.join("out.mp4"),
            per_item_duration: None,
            delay: 0.5,
            style: AnimationStyle::Random,
        }
    }

    #[test]
    fn test_load_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.webp"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.png")).unwrap();

        let names: Vec<String> = load_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.webp"]);
    }

    #[test]
    fn test_validate_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path());

        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("video not found"));

        std::fs::write(&req.video, b"").unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("image folder not found"));

        std::fs::write(&req.image_dir, b"").unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("not a folder"));

        std::fs::remove_file(&req.image_dir).unwrap();
        std::fs::create_dir(&req.image_dir).unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("no images"));

        std::fs::write(req.image_dir.join("1.png"), b"").unwrap();
        req.per_item_duration = Some(0.0);
        assert!(matches!(req.validate(), Err(ReelError::OverlayInput { .. })));
        req.per_item_duration = Some(0.05);
        assert!(req.validate().unwrap_err().to_string().contains("at least"));

        req.per_item_duration = Some(2.0);
        assert_eq!(req.validate().unwrap().len(), 1);
    }

    #[test]
    fn test_plan_image_overlays() {
        let images = vec![
            (PathBuf::from("a.png"), Size::new(2000, 1000)),
            (PathBuf::from("b.png"), Size::new(300, 300)),
            (PathBuf::from("c.png"), Size::new(500, 4000)),
            (PathBuf::from("d.png"), Size::new(800, 600)),
        ];
        let frame = Size::new(1080, 1920);
        let plan = plan_image_overlays(
            &images,
            frame,
            8.0,
            None,
            1.0,
            AnimationStyle::Random,
            &EngineConfig::default(),
            &mut StdRng::seed_from_u64(9),
        );

        assert_eq!(plan.items.len(), 4);
        assert!((plan.schedule.per_item_duration - 1.25).abs() < 1e-9);
        assert_eq!(plan.items[3].window.end, 8.0);
        assert_eq!(plan.layers[1].size, Size::new(300, 300));
        for (item, layer) in plan.items.iter().zip(&plan.layers) {
            assert!(!item.style.is_random());
            assert!(layer.size.width <= 918 && layer.size.height <= 1632);
        }

        let graph = plan.filter_graph().unwrap();
        assert!(graph.contains("[4:v]scale="));
        assert!(graph.contains("enable='between(t,6.750,8.000)'"));
    }

    #[test]
    fn test_plan_is_deterministic_per_seed() {
        let images = vec![(PathBuf::from("a.png"), Size::new(400, 400)); 6];
        let plan = |seed| {
            plan_image_overlays(
                &images,
                Size::new(1080, 1920),
                30.0,
                Some(3.0),
                0.5,
                AnimationStyle::Random,
                &EngineConfig::default(),
                &mut StdRng::seed_from_u64(seed),
            )
        };
        assert_eq!(plan(4).filter_graph(), plan(4).filter_graph());
    }

    #[test]
    fn test_validate_caption_text() {
        assert_eq!(validate_caption_text("  hi there ").unwrap(), "hi there");
        assert!(validate_caption_text("   ").is_err());
        assert!(validate_caption_text(&"x".repeat(100)).is_ok());
        assert!(validate_caption_text(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_plan_caption() {
        let plan = plan_caption(
            "Twenty characters!!!",
            Size::new(1080, 1920),
            &EngineConfig::default(),
            &CaptionStyle::default(),
        )
        .unwrap();
        assert_eq!(plan.layout.font_size, 76);
        assert!(plan.filter.contains("fontsize=76"));
        assert!(plan.filter.contains("text='Twenty characters!!!'"));
        assert_eq!(
            plan.box_origin.y,
            (1920 - plan.layout.box_height - 100) as f64
        );
    }

    #[tokio::test]
    async fn test_caption_rejects_bad_text_before_probing() {
        let backend = std::sync::Arc::new(crate::export::tests::RecordingBackend::default());
        let renderer = crate::export::tests::renderer(&backend);
        let err = overlay_caption(
            &renderer,
            Path::new("/nonexistent.mp4"),
            Path::new("/tmp/out.mp4"),
            "",
            &CaptionStyle::default(),
            &EngineConfig::default(),
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReelError::OverlayInput { .. }));
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}
