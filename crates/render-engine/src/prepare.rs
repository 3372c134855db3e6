//! Source preparation: bring every source video to a common frame and
//! rate, then join them into the single source the timeline cuts from.
//!
//! ```text
//! a.mov ── normalize ──┐
//! b.mp4 ── normalize ──┼── combine ── source.mp4
//! c.mp4 ── (as is) ────┘
//! ```

use std::path::{Path, PathBuf};

use reelcut_common::config::{CropMode, EncoderConfig, PrepareConfig};
use reelcut_common::error::{ReelError, ReelResult};
use reelcut_project_model::geometry::Size;

use crate::command::FfmpegCommand;
use crate::export::{write_concat_list, Renderer};
use crate::probe::{probe_media, MediaInfo};
use crate::workspace::WorkDir;

pub const DENOISE_FILTER: &str = "hqdn3d=1.5:1.5:6:6";
pub const DESHAKE_FILTER: &str = "deshake";
pub const SHARPEN_FILTER: &str = "unsharp=5:5:1.0:5:5:0.0";

/// Frame rates closer than this are left alone.
const FPS_TOLERANCE: f64 = 0.1;

/// Target format for normalized sources.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    pub target: Size,
    pub fps: u32,
    pub crop: CropMode,
    pub denoise: bool,
    pub deshake: bool,
    pub sharpen: bool,
}

impl NormalizeOptions {
    pub fn from_config(prepare: &PrepareConfig, encoder: &EncoderConfig) -> Self {
        let (width, height) = prepare.resolution.dimensions();
        Self {
            target: Size::new(width, height),
            fps: encoder.fps,
            crop: prepare.crop,
            denoise: prepare.denoise,
            deshake: prepare.deshake,
            sharpen: prepare.sharpen,
        }
    }

    fn enhances(&self) -> bool {
        self.denoise || self.deshake || self.sharpen
    }
}

/// A source video and what ffprobe said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSource {
    pub path: PathBuf,
    pub info: MediaInfo,
}

/// Whether `info` differs from the target frame size or rate, or the
/// options ask for enhancement filters.
pub fn needs_normalization(info: &MediaInfo, opts: &NormalizeOptions) -> bool {
    info.size() != opts.target || (info.fps - opts.fps as f64).abs() > FPS_TOLERANCE || opts.enhances()
}

/// `-vf` chain bringing a `input` sized frame to the target format.
///
/// Denoise and deshake run on the source frame, sharpen on the scaled one.
/// An `fps` filter is added only when the rate differs.
pub fn build_normalize_filter(input: &MediaInfo, opts: &NormalizeOptions) -> String {
    let mut filters: Vec<String> = Vec::new();
    if opts.denoise {
        filters.push(DENOISE_FILTER.to_string());
    }
    if opts.deshake {
        filters.push(DESHAKE_FILTER.to_string());
    }

    let (tw, th) = (opts.target.width, opts.target.height);
    match opts.crop {
        CropMode::Center => {
            let (iw, ih) = (input.width, input.height);
            let target_aspect = tw as f64 / th as f64;
            let input_aspect = iw as f64 / ih.max(1) as f64;
            let (cw, ch, cx, cy) = if input_aspect > target_aspect {
                let cw = ((ih as f64 * target_aspect) as u32).min(iw);
                (cw, ih, (iw - cw) / 2, 0)
            } else {
                let ch = ((iw as f64 / target_aspect) as u32).min(ih);
                (iw, ch, 0, (ih - ch) / 2)
            };
            filters.push(format!("crop={cw}:{ch}:{cx}:{cy}"));
            filters.push(format!("scale={tw}:{th}"));
        }
        CropMode::Fit => {
            filters.push(format!("scale={tw}:{th}:force_original_aspect_ratio=decrease"));
            filters.push(format!("pad={tw}:{th}:(ow-iw)/2:(oh-ih)/2"));
        }
        CropMode::Stretch => filters.push(format!("scale={tw}:{th}")),
    }
    filters.push("setsar=1".to_string());

    if opts.sharpen {
        filters.push(SHARPEN_FILTER.to_string());
    }
    if (input.fps - opts.fps as f64).abs() > FPS_TOLERANCE {
        filters.push(format!("fps={}", opts.fps));
    }
    filters.join(",")
}

/// Command re-encoding `source` into `output` through `filter`.
pub fn normalize_command(
    encoder: &EncoderConfig,
    source: &Path,
    filter: &str,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(source)
        .video_filter(filter)
        .encode_video(encoder, &encoder.preset)
        .audio_codec(encoder.audio_codec.clone())
        .audio_bitrate(encoder.audio_bitrate.clone())
        .faststart()
        .log_level(encoder.loglevel.clone())
}

/// Re-encode `source` to the target format.
pub async fn normalize_source(
    renderer: &Renderer,
    source: &PreparedSource,
    opts: &NormalizeOptions,
    output: &Path,
) -> ReelResult<PreparedSource> {
    if !source.info.has_video() {
        return Err(ReelError::source_prep(format!(
            "{} has no video stream",
            source.path.display()
        )));
    }

    let filter = build_normalize_filter(&source.info, opts);
    tracing::debug!(source = %source.path.display(), filter = %filter, "Normalizing");
    let cmd = normalize_command(renderer.encoder(), &source.path, &filter, output);
    renderer.run(&cmd, source.info.duration).await?;
    if !output.exists() {
        return Err(ReelError::encoding(format!(
            "normalizing {} produced no output",
            source.path.display()
        )));
    }

    Ok(PreparedSource {
        path: output.to_path_buf(),
        info: MediaInfo {
            width: opts.target.width,
            height: opts.target.height,
            fps: opts.fps as f64,
            ..source.info.clone()
        },
    })
}

/// `filter_complex` concatenating `count` inputs, with audio when every
/// input has it.
pub fn build_concat_graph(count: usize, with_audio: bool) -> String {
    let mut graph = String::new();
    for i in 0..count {
        graph.push_str(&format!("[{i}:v]"));
        if with_audio {
            graph.push_str(&format!("[{i}:a]"));
        }
    }
    let a = u8::from(with_audio);
    graph.push_str(&format!("concat=n={count}:v=1:a={a}[outv]"));
    if with_audio {
        graph.push_str("[outa]");
    }
    graph
}

/// Join `sources` end to end into `output`.
///
/// A single source is copied as is. Several are joined by stream copy
/// first, then re-encoded through the concat filter if that fails.
pub async fn combine_sources(
    renderer: &Renderer,
    sources: &[PreparedSource],
    work: &WorkDir,
    output: &Path,
) -> ReelResult<PreparedSource> {
    let Some(first) = sources.first() else {
        return Err(ReelError::source_prep("no sources to combine"));
    };

    let duration: f64 = sources.iter().map(|s| s.info.duration).sum();
    let with_audio = sources.iter().all(|s| s.info.has_audio);
    let info = MediaInfo {
        duration,
        has_audio: with_audio,
        ..first.info.clone()
    };

    if sources.len() == 1 {
        if first.path != output {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&first.path, output)?;
        }
        return Ok(PreparedSource {
            path: output.to_path_buf(),
            info,
        });
    }

    let paths: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
    let list = work.file("sources_list.txt");
    write_concat_list(&paths, &list)?;

    let encoder = renderer.encoder();
    let copy = FfmpegCommand::new(output)
        .input_with(["-f", "concat", "-safe", "0"], &list)
        .output_args(["-c", "copy"])
        .faststart()
        .log_level(encoder.loglevel.clone());

    if let Err(e) = renderer.run(&copy, duration).await {
        tracing::warn!(error = %e, sources = sources.len(), "Stream-copy join failed, re-encoding");

        let mut cmd = FfmpegCommand::new(output);
        for path in &paths {
            cmd = cmd.input(path);
        }
        cmd = cmd
            .filter_complex(build_concat_graph(paths.len(), with_audio))
            .map("[outv]");
        if with_audio {
            cmd = cmd
                .map("[outa]")
                .audio_codec(encoder.audio_codec.clone())
                .audio_bitrate(encoder.audio_bitrate.clone());
        }
        let cmd = cmd
            .encode_video(encoder, &encoder.preset)
            .faststart()
            .log_level(encoder.loglevel.clone());
        renderer.run(&cmd, duration).await?;
    }

    tracing::info!(
        sources = sources.len(),
        duration,
        output = %output.display(),
        "Combined sources"
    );
    Ok(PreparedSource {
        path: output.to_path_buf(),
        info,
    })
}

/// Normalize (when asked and needed) and combine already probed sources.
///
/// Sources that fail to normalize are dropped with a warning; it is an
/// error if none remain.
pub async fn prepare_probed(
    renderer: &Renderer,
    sources: Vec<PreparedSource>,
    opts: Option<&NormalizeOptions>,
    work: &WorkDir,
    output: &Path,
) -> ReelResult<PreparedSource> {
    if sources.is_empty() {
        return Err(ReelError::source_prep("no source videos given"));
    }
    let total = sources.len();

    let mut ready = Vec::with_capacity(total);
    for (i, source) in sources.into_iter().enumerate() {
        let Some(opts) = opts.filter(|o| needs_normalization(&source.info, o)) else {
            ready.push(source);
            continue;
        };
        let normalized = work.file(&format!("normalized_{i:02}.mp4"));
        match normalize_source(renderer, &source, opts, &normalized).await {
            Ok(done) => ready.push(done),
            Err(e) => tracing::warn!(
                source = %source.path.display(),
                error = %e,
                "Dropping source that failed to normalize"
            ),
        }
    }

    if ready.is_empty() {
        return Err(ReelError::source_prep(format!(
            "none of {total} sources could be normalized"
        )));
    }
    combine_sources(renderer, &ready, work, output).await
}

/// Probe, normalize and combine `videos` into `output`.
pub async fn prepare_sources(
    renderer: &Renderer,
    videos: &[PathBuf],
    opts: Option<&NormalizeOptions>,
    work: &WorkDir,
    output: &Path,
) -> ReelResult<PreparedSource> {
    let mut sources = Vec::with_capacity(videos.len());
    for path in videos {
        if !path.is_file() {
            return Err(ReelError::FileNotFound { path: path.clone() });
        }
        let info = probe_media(path).await?;
        if !info.has_video() {
            return Err(ReelError::source_prep(format!(
                "{} has no video stream",
                path.display()
            )));
        }
        sources.push(PreparedSource {
            path: path.clone(),
            info,
        });
    }
    prepare_probed(renderer, sources, opts, work, output).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::{renderer, RecordingBackend};
    use reelcut_common::config::ResolutionPreset;
    use std::sync::Arc;

    fn info(width: u32, height: u32, fps: f64, duration: f64) -> MediaInfo {
        MediaInfo {
            duration,
            width,
            height,
            fps,
            has_audio: true,
        }
    }

    fn reels() -> NormalizeOptions {
        NormalizeOptions::from_config(&PrepareConfig::default(), &EncoderConfig::default())
    }

    fn source(dir: &Path, name: &str, info: MediaInfo) -> PreparedSource {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        PreparedSource { path, info }
    }

    #[test]
    fn test_options_follow_config() {
        let prepare = PrepareConfig {
            resolution: ResolutionPreset::Landscape,
            crop: CropMode::Fit,
            sharpen: true,
            ..PrepareConfig::default()
        };
        let opts = NormalizeOptions::from_config(&prepare, &EncoderConfig::default());
        assert_eq!(opts.target, Size::new(1920, 1080));
        assert_eq!(opts.fps, 30);
        assert_eq!(opts.crop, CropMode::Fit);
        assert!(opts.sharpen && !opts.denoise);
    }

    #[test]
    fn test_center_crop_landscape_to_portrait() {
        let filter = build_normalize_filter(&info(1920, 1080, 30.0, 10.0), &reels());
        assert_eq!(filter, "crop=607:1080:656:0,scale=1080:1920,setsar=1");
    }

    #[test]
    fn test_center_crop_tall_source_trims_height() {
        let filter = build_normalize_filter(&info(1080, 2400, 30.0, 10.0), &reels());
        assert_eq!(filter, "crop=1080:1920:0:240,scale=1080:1920,setsar=1");
    }

    #[test]
    fn test_fit_pads_and_fixes_rate() {
        let opts = NormalizeOptions {
            crop: CropMode::Fit,
            ..reels()
        };
        let filter = build_normalize_filter(&info(1920, 1080, 59.94, 10.0), &opts);
        assert_eq!(
            filter,
            "scale=1080:1920:force_original_aspect_ratio=decrease,\
             pad=1080:1920:(ow-iw)/2:(oh-ih)/2,setsar=1,fps=30"
        );
    }

    #[test]
    fn test_enhancement_filter_order() {
        let opts = NormalizeOptions {
            crop: CropMode::Stretch,
            denoise: true,
            deshake: true,
            sharpen: true,
            ..reels()
        };
        let filter = build_normalize_filter(&info(1080, 1920, 30.0, 10.0), &opts);
        assert_eq!(
            filter,
            format!("{DENOISE_FILTER},{DESHAKE_FILTER},scale=1080:1920,setsar=1,{SHARPEN_FILTER}")
        );
    }

    #[test]
    fn test_needs_normalization() {
        let opts = reels();
        assert!(!needs_normalization(&info(1080, 1920, 30.0, 5.0), &opts));
        assert!(!needs_normalization(&info(1080, 1920, 29.97, 5.0), &opts));
        assert!(needs_normalization(&info(1080, 1920, 25.0, 5.0), &opts));
        assert!(needs_normalization(&info(1920, 1080, 30.0, 5.0), &opts));

        let denoise = NormalizeOptions {
            denoise: true,
            ..opts
        };
        assert!(needs_normalization(&info(1080, 1920, 30.0, 5.0), &denoise));
    }

    #[test]
    fn test_concat_graph() {
        assert_eq!(
            build_concat_graph(2, true),
            "[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[outv][outa]"
        );
        assert_eq!(build_concat_graph(3, false), "[0:v][1:v][2:v]concat=n=3:v=1:a=0[outv]");
    }

    #[tokio::test]
    async fn test_combine_single_source_copies_without_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();
        let only = source(dir.path(), "a.mp4", info(1080, 1920, 30.0, 12.0));
        let out = dir.path().join("out").join("combined.mp4");

        let combined = combine_sources(&r, &[only], &work, &out).await.unwrap();
        assert_eq!(combined.path, out);
        assert!(out.exists());
        assert_eq!(combined.info.duration, 12.0);
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_combine_stream_copies_first() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();
        let sources = vec![
            source(dir.path(), "a.mp4", info(1080, 1920, 30.0, 4.0)),
            source(dir.path(), "b.mp4", info(1080, 1920, 30.0, 6.5)),
        ];
        let out = dir.path().join("combined.mp4");

        let combined = combine_sources(&r, &sources, &work, &out).await.unwrap();
        assert!((combined.info.duration - 10.5).abs() < 1e-9);

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let joined = calls[0].join(" ");
        assert!(joined.contains("-f concat -safe 0 -i"));
        assert!(joined.contains("-c copy -movflags faststart"));

        let list = std::fs::read_to_string(work.file("sources_list.txt")).unwrap();
        assert_eq!(list.lines().count(), 2);
        assert!(list.contains("a.mp4") && list.contains("b.mp4"));
    }

    #[tokio::test]
    async fn test_combine_falls_back_to_concat_filter() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::failing_on("copy"));
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();
        let mut silent = info(1080, 1920, 30.0, 3.0);
        silent.has_audio = false;
        let sources = vec![
            source(dir.path(), "a.mp4", info(1080, 1920, 30.0, 4.0)),
            source(dir.path(), "b.mp4", silent),
        ];
        let out = dir.path().join("combined.mp4");

        let combined = combine_sources(&r, &sources, &work, &out).await.unwrap();
        assert!(!combined.info.has_audio);

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let reencode = calls[1].join(" ");
        assert!(reencode.contains("-filter_complex [0:v][1:v]concat=n=2:v=1:a=0[outv]"));
        assert!(reencode.contains("-map [outv]"));
        assert!(!reencode.contains("[outa]"));
        assert!(reencode.contains("-c:v libx264 -preset medium -crf 23"));
    }

    #[tokio::test]
    async fn test_prepare_normalizes_only_mismatched_sources() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();
        let sources = vec![
            source(dir.path(), "wide.mp4", info(1920, 1080, 25.0, 8.0)),
            source(dir.path(), "ready.mp4", info(1080, 1920, 30.0, 5.0)),
        ];
        let opts = reels();
        let out = dir.path().join("source.mp4");

        let prepared = prepare_probed(&r, sources, Some(&opts), &work, &out)
            .await
            .unwrap();
        assert_eq!(prepared.path, out);
        assert_eq!(prepared.info.size(), Size::new(1080, 1920));
        assert!((prepared.info.duration - 13.0).abs() < 1e-9);

        let calls = backend.calls.lock().unwrap();
        // one normalize, one join
        assert_eq!(calls.len(), 2);
        let normalize = calls[0].join(" ");
        assert!(normalize.contains("wide.mp4"));
        assert!(normalize.contains("-vf crop=607:1080:656:0,scale=1080:1920,setsar=1,fps=30"));
        assert!(normalize.ends_with("normalized_00.mp4"));

        let list = std::fs::read_to_string(work.file("sources_list.txt")).unwrap();
        assert!(list.contains("normalized_00.mp4"));
        assert!(list.contains("ready.mp4"));
    }

    #[tokio::test]
    async fn test_prepare_drops_sources_that_fail_to_normalize() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::failing_on("normalized_01"));
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();
        let sources = vec![
            source(dir.path(), "a.mp4", info(1920, 1080, 30.0, 4.0)),
            source(dir.path(), "b.mp4", info(1920, 1080, 30.0, 6.0)),
        ];
        let out = dir.path().join("source.mp4");

        let prepared = prepare_probed(&r, sources, Some(&reels()), &work, &out)
            .await
            .unwrap();
        // only the first survives and is copied into place
        assert!((prepared.info.duration - 4.0).abs() < 1e-9);
        assert_eq!(backend.calls.lock().unwrap().len(), 2);
        assert!(out.exists());
    }

    #[tokio::test]
    async fn test_prepare_fails_when_nothing_survives() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::failing_on("normalized_"));
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();
        let sources = vec![source(dir.path(), "a.mp4", info(640, 480, 30.0, 4.0))];

        let err = prepare_probed(&r, sources, Some(&reels()), &work, &dir.path().join("o.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::SourcePrep { .. }));
    }

    #[tokio::test]
    async fn test_prepare_without_normalization_and_no_sources() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();

        let err = prepare_probed(&r, Vec::new(), None, &work, &dir.path().join("o.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::SourcePrep { .. }));

        let sources = vec![
            source(dir.path(), "a.mp4", info(1920, 1080, 25.0, 4.0)),
            source(dir.path(), "b.mp4", info(1280, 720, 24.0, 2.0)),
        ];
        prepare_probed(&r, sources, None, &work, &dir.path().join("o.mp4"))
            .await
            .unwrap();
        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].join(" ").contains("-c copy"));
    }

    #[tokio::test]
    async fn test_prepare_sources_rejects_missing_file() {
        let backend = Arc::new(RecordingBackend::default());
        let r = renderer(&backend);
        let work = WorkDir::new().unwrap();
        let err = prepare_sources(
            &r,
            &[PathBuf::from("/nonexistent/a.mp4")],
            None,
            &work,
            &work.file("o.mp4"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReelError::FileNotFound { .. }));
    }
}
