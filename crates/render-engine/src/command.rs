//! ffmpeg command builder and async runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use reelcut_common::config::EncoderConfig;
use reelcut_common::error::{ReelError, ReelResult};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// One `-i` input together with the options that precede it.
#[derive(Debug, Clone, PartialEq)]
struct FfmpegInput {
    args: Vec<String>,
    path: PathBuf,
}

/// Builder for ffmpeg invocations with any number of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    inputs: Vec<FfmpegInput>,
    output: PathBuf,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a plain input.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with(std::iter::empty::<String>(), path)
    }

    /// Add an input preceded by input options (e.g. `-ss`, `-loop`).
    pub fn input_with<I, S>(mut self, args: I, path: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(FfmpegInput {
            args: args.into_iter().map(Into::into).collect(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn filter_complex(self, graph: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(graph)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Output duration limit.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format_secs(seconds))
    }

    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Move the moov atom to the front for progressive playback.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("faststart")
    }

    /// Video codec, preset and CRF from `encoder`, using `preset`.
    pub fn encode_video(self, encoder: &EncoderConfig, preset: &str) -> Self {
        self.video_codec(encoder.video_codec.clone())
            .preset(preset)
            .crf(encoder.crf)
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Full argument list, excluding the program name.
    ///
    /// Progress is requested on stdout as `key=value` lines.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.overwrite {
            args.push("-y".to_string());
        }
        args.extend([
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
            "-progress".to_string(),
            "pipe:1".to_string(),
        ]);

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().into_owned());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Seconds formatted for ffmpeg time options.
pub fn format_secs(seconds: f64) -> String {
    format!("{:.3}", seconds.max(0.0))
}

/// Encoder progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProgress {
    /// Progress in `[0.0, 1.0]` (0 when the expected duration is unknown).
    pub progress: f64,
    /// Output time reached so far (seconds).
    pub out_time_secs: f64,
    /// Estimated seconds remaining.
    pub eta_secs: f64,
    /// The encoder reported `progress=end`.
    pub complete: bool,
}

/// Progress callback for encoder runs.
pub type ProgressFn = dyn Fn(RenderProgress) + Send + Sync;

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    /// Apply one `-progress` line. Returns true at the end of a block.
    fn update(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.trim().split_once('=') else {
            return false;
        };
        match key {
            // out_time_ms is in microseconds despite its name
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
                false
            }
            "progress" => {
                self.complete = value == "end";
                true
            }
            _ => false,
        }
    }

    fn report(&self, expected_secs: f64, elapsed_secs: f64) -> RenderProgress {
        let progress = if expected_secs <= 0.0 {
            0.0
        } else {
            (self.out_time_secs / expected_secs).clamp(0.0, 1.0)
        };
        let eta_secs = if progress > 0.0 {
            (elapsed_secs / progress - elapsed_secs).max(0.0)
        } else {
            0.0
        };
        RenderProgress {
            progress: if self.complete { 1.0 } else { progress },
            out_time_secs: self.out_time_secs,
            eta_secs,
            complete: self.complete,
        }
    }
}

/// Runs ffmpeg commands under an optional timeout.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            timeout: None,
        }
    }

    /// Use a specific ffmpeg binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the encoder after `secs` seconds. Zero disables the limit.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `cmd` to completion.
    ///
    /// `expected_secs` is the output duration used to scale progress.
    pub async fn run(
        &self,
        cmd: &FfmpegCommand,
        expected_secs: f64,
        progress: Option<&ProgressFn>,
    ) -> ReelResult<()> {
        let args = cmd.build_args();
        tracing::debug!(program = %self.program.display(), args = ?args, "Running ffmpeg");

        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ReelError::encoding(format!("Failed to start {}: {e}", self.program.display()))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::encoding("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encoding("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            if let Err(err) = BufReader::new(stderr).read_to_string(&mut output).await {
                output = format!("<failed to read ffmpeg stderr: {err}>");
            }
            output
        });

        let work = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut state = ProgressState::default();
            while let Some(line) = lines.next_line().await? {
                if state.update(&line) {
                    if let Some(cb) = progress {
                        cb(state.report(expected_secs, started.elapsed().as_secs_f64()));
                    }
                }
            }
            child.wait().await
        };

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result?,
                Err(_) => {
                    let secs = limit.as_secs();
                    tracing::warn!(secs, "ffmpeg timed out, killing process");
                    if let Err(err) = child.kill().await {
                        tracing::warn!(error = %err, "Failed to kill ffmpeg");
                    }
                    return Err(ReelError::Timeout { secs });
                }
            },
            None => work.await?,
        };

        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(ReelError::encoding(format!(
                "ffmpeg failed ({}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::debug!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            output = %cmd.output_path().display(),
            "ffmpeg finished"
        );
        Ok(())
    }
}

/// Locate ffmpeg.
pub fn check_ffmpeg() -> ReelResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| ReelError::unsupported("ffmpeg not found in PATH"))
}

/// Locate ffprobe.
pub fn check_ffprobe() -> ReelResult<PathBuf> {
    which::which("ffprobe").map_err(|_| ReelError::unsupported("ffprobe not found in PATH"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_keep_their_options() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("video.mp4")
            .input_with(["-ss", "12.500", "-t", "8.000"], "song.mp3")
            .map("0:v:0")
            .map("1:a:0");
        let args = cmd.build_args();

        let first_i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[first_i + 1], "video.mp4");
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert!(ss > first_i);
        assert_eq!(args[ss + 4], "-i");
        assert_eq!(args[ss + 5], "song.mp3");
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert_eq!(cmd.input_count(), 2);
    }

    #[test]
    fn test_encode_video_uses_config() {
        let encoder = EncoderConfig::default();
        let args = FfmpegCommand::new("o.mp4")
            .input("i.mp4")
            .encode_video(&encoder, "ultrafast")
            .build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264 -preset ultrafast -crf 23"));
        assert!(joined.starts_with("-y "));
        assert!(joined.contains("-progress pipe:1"));
    }

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(1.23456), "1.235");
        assert_eq!(format_secs(-2.0), "0.000");
    }

    #[test]
    fn test_progress_state() {
        let mut state = ProgressState::default();
        assert!(!state.update("frame=10"));
        assert!(!state.update("out_time_us=2500000"));
        assert!(state.update("progress=continue"));
        let report = state.report(10.0, 1.0);
        assert!((report.progress - 0.25).abs() < 1e-9);
        assert!((report.eta_secs - 3.0).abs() < 1e-9);

        state.update("progress=end");
        let report = state.report(10.0, 2.0);
        assert_eq!(report.progress, 1.0);
        assert!(report.complete);
    }

    #[test]
    fn test_runner_timeout_zero_disables() {
        let runner = FfmpegRunner::new().with_timeout(0);
        assert!(runner.timeout.is_none());
        let runner = FfmpegRunner::new().with_timeout(5);
        assert_eq!(runner.timeout, Some(Duration::from_secs(5)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_reports_failure() {
        let runner = FfmpegRunner::new().with_program("false");
        let cmd = FfmpegCommand::new("/tmp/none.mp4").input("x");
        let err = runner.run(&cmd, 1.0, None).await.unwrap_err();
        assert!(matches!(err, ReelError::Encoding { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_kills_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = FfmpegRunner::new().with_program(&script).with_timeout(1);
        let cmd = FfmpegCommand::new(dir.path().join("o.mp4"));
        let started = Instant::now();
        let err = runner.run(&cmd, 1.0, None).await.unwrap_err();
        assert!(matches!(err, ReelError::Timeout { secs: 1 }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
