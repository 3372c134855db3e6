//! Media probing via ffprobe.

use std::path::Path;
use std::process::Stdio;

use reelcut_common::error::{ReelError, ReelResult};
use reelcut_project_model::geometry::Size;
use serde::Deserialize;
use tokio::process::Command;

/// Facts about a media file that the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration: f64,
    /// Width of the first video stream (0 for audio-only files).
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub has_audio: bool,
}

impl MediaInfo {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn has_video(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Parse `ffprobe -show_format -show_streams -of json` output.
pub fn parse_ffprobe_json(json: &str) -> ReelResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ReelError::probe(format!("invalid ffprobe output: {e}")))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let format_duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    let stream_duration = probe
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref()?.parse::<f64>().ok())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

    // Still images report no duration.
    let duration = match format_duration.or(stream_duration) {
        Some(d) if d.is_finite() && d >= 0.0 => d,
        Some(d) => return Err(ReelError::probe(format!("invalid duration {d}"))),
        None if video.is_some() => 0.0,
        None => return Err(ReelError::probe("no duration in ffprobe output")),
    };

    let (width, height, fps) = match video {
        Some(v) => {
            let fps = v
                .avg_frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .or_else(|| v.r_frame_rate.as_deref().and_then(parse_frame_rate))
                .unwrap_or(0.0);
            (v.width.unwrap_or(0), v.height.unwrap_or(0), fps)
        }
        None => (0, 0, 0.0),
    };

    Ok(MediaInfo {
        duration,
        width,
        height,
        fps,
        has_audio,
    })
}

/// Parse a frame rate like `30000/1001` or `25`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Probe `path` with ffprobe.
pub async fn probe_media(path: &Path) -> ReelResult<MediaInfo> {
    if !path.exists() {
        return Err(ReelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_format",
            "-show_streams",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ReelError::probe(format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ReelError::probe(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let info = parse_ffprobe_json(&String::from_utf8_lossy(&output.stdout))?;
    tracing::debug!(
        path = %path.display(),
        duration = info.duration,
        width = info.width,
        height = info.height,
        "Probed media"
    );
    Ok(info)
}

/// Media duration in seconds.
pub async fn probe_duration(path: &Path) -> ReelResult<f64> {
    Ok(probe_media(path).await?.duration)
}

/// Pixel dimensions of the first video stream (images included).
pub async fn probe_dimensions(path: &Path) -> ReelResult<Size> {
    let info = probe_media(path).await?;
    if !info.has_video() {
        return Err(ReelError::probe(format!(
            "{} has no video stream",
            path.display()
        )));
    }
    Ok(info.size())
}
