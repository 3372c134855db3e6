//! Timeline rendering: segment extraction, concatenation, audio mux.
//!
//! ```text
//! source.mp4 ──┬── segment_0000.mp4 ──┐
//!              ├── segment_0001.mp4 ──┼── concat ── mux ── output.mp4
//!              └── segment_000N.mp4 ──┘              │
//! song.mp3 ──────────── [audio_start, +duration] ────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reelcut_common::config::EncoderConfig;
use reelcut_common::error::{ReelError, ReelResult};
use reelcut_project_model::timeline::{Segment, Timeline};

use crate::command::{format_secs, FfmpegCommand, FfmpegRunner, ProgressFn};
use crate::workspace::WorkDir;

/// Executes encoder commands.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Run one command to completion. `expected_secs` is the output length.
    async fn run(&self, cmd: &FfmpegCommand, expected_secs: f64) -> ReelResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Backend running the `ffmpeg` binary.
pub struct FfmpegBackend {
    runner: FfmpegRunner,
    progress: Option<Arc<ProgressFn>>,
}

impl FfmpegBackend {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self {
            runner,
            progress: None,
        }
    }

    /// ffmpeg from `PATH` with the configured timeout.
    pub fn from_config(encoder: &EncoderConfig) -> Self {
        Self::new(FfmpegRunner::new().with_timeout(encoder.timeout_secs))
    }

    pub fn with_progress(mut self, progress: Arc<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[async_trait]
impl RenderBackend for FfmpegBackend {
    async fn run(&self, cmd: &FfmpegCommand, expected_secs: f64) -> ReelResult<()> {
        self.runner
            .run(cmd, expected_secs, self.progress.as_deref())
            .await
    }

    fn is_available(&self) -> bool {
        let program = self.runner.program();
        program.is_file() || which::which(program).is_ok()
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Inputs for one timeline render.
#[derive(Debug, Clone)]
pub struct TimelineJob {
    pub source_video: PathBuf,
    pub audio: PathBuf,
    /// Offset into the audio track where the soundtrack starts.
    pub audio_start: f64,
    pub timeline: Timeline,
    pub output: PathBuf,
}

/// Drives a [`RenderBackend`] through the render pipeline.
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    encoder: EncoderConfig,
}

impl Renderer {
    pub fn new(backend: Box<dyn RenderBackend>, encoder: EncoderConfig) -> Self {
        Self { backend, encoder }
    }

    /// Renderer using the ffmpeg binary.
    pub fn ffmpeg(encoder: &EncoderConfig) -> Self {
        Self::new(Box::new(FfmpegBackend::from_config(encoder)), encoder.clone())
    }

    pub fn encoder(&self) -> &EncoderConfig {
        &self.encoder
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Run a single command on the backend.
    pub async fn run(&self, cmd: &FfmpegCommand, expected_secs: f64) -> ReelResult<()> {
        ensure_parent_dir(cmd.output_path())?;
        self.backend.run(cmd, expected_secs).await
    }

    /// Command extracting `segment` from `source` into `output`.
    pub fn segment_command(&self, source: &Path, segment: &Segment, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(output)
            .input_with(["-ss".to_string(), format_secs(segment.source_start)], source)
            .duration(segment.duration)
            .encode_video(&self.encoder, &self.encoder.segment_preset)
            .audio_codec(self.encoder.audio_codec.clone())
            .audio_bitrate(self.encoder.audio_bitrate.clone())
            .output_args(["-avoid_negative_ts", "make_zero"])
            .log_level(self.encoder.loglevel.clone())
    }

    /// Extract every segment into `work`, in timeline order.
    ///
    /// A failed segment is dropped with a warning. Returns
    /// [`ReelError::EmptyTimeline`] if none survive.
    pub async fn materialize_segments(
        &self,
        source: &Path,
        timeline: &Timeline,
        work: &WorkDir,
    ) -> ReelResult<Vec<PathBuf>> {
        let mut clips = Vec::with_capacity(timeline.len());

        for segment in timeline.iter() {
            let output = work.segment_path(segment.index);
            let cmd = self.segment_command(source, segment, &output);
            let result = match self.backend.run(&cmd, segment.duration).await {
                Ok(()) if output.exists() => Ok(()),
                Ok(()) => Err(ReelError::segment_extraction(
                    segment.index,
                    "encoder produced no output",
                )),
                Err(e) => Err(ReelError::segment_extraction(segment.index, e.to_string())),
            };

            match result {
                Ok(()) => clips.push(output),
                Err(e) => tracing::warn!(
                    index = segment.index,
                    start = segment.source_start,
                    duration = segment.duration,
                    error = %e,
                    "Dropping segment"
                ),
            }
        }

        if clips.is_empty() {
            return Err(ReelError::EmptyTimeline);
        }

        tracing::info!(
            planned = timeline.len(),
            extracted = clips.len(),
            "Materialized segments"
        );
        Ok(clips)
    }

    /// Concatenate `clips` into `output`.
    ///
    /// Tries a stream copy first and re-encodes if that fails.
    pub async fn concat_segments(
        &self,
        clips: &[PathBuf],
        work: &WorkDir,
        output: &Path,
        expected_secs: f64,
    ) -> ReelResult<()> {
        if clips.is_empty() {
            return Err(ReelError::EmptyTimeline);
        }

        let list = work.file("concat_list.txt");
        write_concat_list(clips, &list)?;

        let concat_input = ["-f", "concat", "-safe", "0"];
        let copy = FfmpegCommand::new(output)
            .input_with(concat_input, &list)
            .output_args(["-c", "copy"])
            .log_level(self.encoder.loglevel.clone());

        match self.run(&copy, expected_secs).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Stream-copy concat failed, re-encoding");
            }
        }

        let reencode = FfmpegCommand::new(output)
            .input_with(concat_input, &list)
            .encode_video(&self.encoder, &self.encoder.preset)
            .audio_codec(self.encoder.audio_codec.clone())
            .audio_bitrate(self.encoder.audio_bitrate.clone())
            .log_level(self.encoder.loglevel.clone());
        self.run(&reencode, expected_secs).await
    }

    /// Replace the audio of `video` with `duration` seconds of `audio` from
    /// `audio_start`.
    pub async fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        audio_start: f64,
        duration: f64,
        output: &Path,
    ) -> ReelResult<()> {
        let cmd = FfmpegCommand::new(output)
            .input(video)
            .input_with(
                [
                    "-ss".to_string(),
                    format_secs(audio_start),
                    "-t".to_string(),
                    format_secs(duration),
                ],
                audio,
            )
            .video_codec("copy")
            .audio_codec(self.encoder.audio_codec.clone())
            .audio_bitrate(self.encoder.audio_bitrate.clone())
            .map("0:v:0")
            .map("1:a:0")
            .shortest()
            .faststart()
            .log_level(self.encoder.loglevel.clone());
        self.run(&cmd, duration).await
    }

    /// Render `job` end to end. All intermediates live in `work`.
    pub async fn render_timeline(&self, job: &TimelineJob, work: &WorkDir) -> ReelResult<PathBuf> {
        if job.timeline.is_empty() {
            return Err(ReelError::EmptyTimeline);
        }
        for path in [&job.source_video, &job.audio] {
            if !path.exists() {
                return Err(ReelError::FileNotFound { path: path.clone() });
            }
        }

        tracing::info!(
            source = %job.source_video.display(),
            audio = %job.audio.display(),
            segments = job.timeline.len(),
            output = %job.output.display(),
            backend = self.backend_name(),
            "Starting timeline render"
        );

        let clips = self
            .materialize_segments(&job.source_video, &job.timeline, work)
            .await?;

        let concatenated = work.file("concatenated.mp4");
        let video_secs = job.timeline.total_duration();
        self.concat_segments(&clips, work, &concatenated, video_secs)
            .await?;

        self.mux_audio(
            &concatenated,
            &job.audio,
            job.audio_start,
            job.timeline.target_duration,
            &job.output,
        )
        .await?;

        tracing::info!(output = %job.output.display(), "Timeline render complete");
        Ok(job.output.clone())
    }
}

/// Write a concat-demuxer list for `clips`.
pub fn write_concat_list(clips: &[PathBuf], list_path: &Path) -> ReelResult<()> {
    let mut content = String::new();
    for clip in clips {
        let abs = if clip.is_absolute() {
            clip.clone()
        } else {
            std::env::current_dir()?.join(clip)
        };
        let escaped = abs.to_string_lossy().replace('\'', "'\\''");
        content.push_str(&format!("file '{escaped}'\n"));
    }
    std::fs::write(list_path, content)?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
