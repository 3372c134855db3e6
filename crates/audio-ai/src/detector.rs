//! Timestamp detectors.
//!
//! Beat and vocal onset extraction is DSP work done outside this crate.
//! Detectors adapt an external source of timestamps to one contract: given
//! an audio file and a single-stream mode, return ascending seconds, or an
//! empty list if anything goes wrong. Errors never cross this boundary;
//! they are logged and swallowed.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use reelcut_common::error::{ReelError, ReelResult};
use reelcut_processing_core::cut_points::sanitize;
use reelcut_project_model::cut_point::{AnalysisMode, Timestamp};
use serde::Deserialize;

/// Source of single-stream timestamps.
///
/// Implementations only ever receive [`AnalysisMode::Beats`] or
/// [`AnalysisMode::Vocals`]; hybrid merging happens upstream.
pub trait TimestampDetector: Send + Sync {
    /// Detect timestamps. Never fails: returns an empty list on error.
    fn detect(&self, audio_path: &Path, mode: AnalysisMode) -> Vec<Timestamp>;

    /// Check if this detector can run on this system.
    fn is_available(&self) -> bool;

    /// Detector name.
    fn name(&self) -> &str;
}

/// Accepted detector output shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimestampPayload {
    List(Vec<f64>),
    Object { timestamps: Vec<f64> },
}

/// Parse detector JSON: either `[0.5, 1.0]` or `{"timestamps": [0.5, 1.0]}`.
///
/// The result is sanitized (finite, non-negative, ascending).
pub fn parse_timestamps(json: &str) -> ReelResult<Vec<Timestamp>> {
    let payload: TimestampPayload = serde_json::from_str(json.trim())
        .map_err(|e| ReelError::detection(format!("unrecognized detector output: {e}")))?;
    let raw = match payload {
        TimestampPayload::List(v) => v,
        TimestampPayload::Object { timestamps } => timestamps,
    };
    Ok(sanitize(raw))
}

/// Runs an external analysis program.
///
/// Invoked as `<program> [args..] <mode> <audio>`; the program must print
/// detector JSON on stdout and exit 0.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDetector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before the mode and audio path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, audio_path: &Path, mode: AnalysisMode) -> ReelResult<Vec<Timestamp>> {
        if !audio_path.exists() {
            return Err(ReelError::FileNotFound {
                path: audio_path.to_path_buf(),
            });
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(mode.as_str())
            .arg(audio_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ReelError::detection(format!("failed to start {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            return Err(ReelError::detection(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_timestamps(&String::from_utf8_lossy(&output.stdout))
    }
}

impl TimestampDetector for CommandDetector {
    fn detect(&self, audio_path: &Path, mode: AnalysisMode) -> Vec<Timestamp> {
        match self.run(audio_path, mode) {
            Ok(points) => {
                tracing::info!(
                    detector = self.name(),
                    mode = %mode,
                    count = points.len(),
                    "Detected timestamps"
                );
                points
            }
            Err(e) => {
                tracing::warn!(
                    detector = self.name(),
                    audio = %audio_path.display(),
                    mode = %mode,
                    error = %e,
                    "Timestamp detection failed"
                );
                Vec::new()
            }
        }
    }

    fn is_available(&self) -> bool {
        self.program.is_file() || which::which(&self.program).is_ok()
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Reads precomputed timestamps stored next to the audio file.
///
/// For `song.mp3` in beats mode the file is `song.mp3.beats.json`, looked
/// up in `dir` if set, otherwise beside the audio.
#[derive(Debug, Clone, Default)]
pub struct TimestampFileDetector {
    dir: Option<PathBuf>,
}

impl TimestampFileDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Path holding timestamps for `audio_path` in `mode`.
    pub fn timestamps_path(&self, audio_path: &Path, mode: AnalysisMode) -> PathBuf {
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let name = format!("{file_name}.{}.json", mode.as_str());
        match &self.dir {
            Some(dir) => dir.join(name),
            None => audio_path.with_file_name(name),
        }
    }
}

impl TimestampDetector for TimestampFileDetector {
    fn detect(&self, audio_path: &Path, mode: AnalysisMode) -> Vec<Timestamp> {
        let path = self.timestamps_path(audio_path, mode);
        let result = std::fs::read_to_string(&path)
            .map_err(ReelError::from)
            .and_then(|content| parse_timestamps(&content));

        match result {
            Ok(points) => {
                tracing::debug!(path = %path.display(), count = points.len(), "Loaded timestamps");
                points
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not load timestamps");
                Vec::new()
            }
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "timestamp-file"
    }
}
