//! Error types shared across ReelCut crates.

use std::path::PathBuf;

/// Top-level error type for ReelCut operations.
///
/// Detection failures never surface through this type at the detector
/// boundary (detectors return an empty list instead); the `Detection`
/// variant exists for callers that want to report a required detector as
/// unavailable.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("Detection error: {message}")]
    Detection { message: String },

    #[error("Segment {index} extraction failed: {message}")]
    SegmentExtraction { index: usize, message: String },

    #[error("Timeline is empty: no segment could be materialized")]
    EmptyTimeline,

    #[error("Invalid overlay input: {message}")]
    OverlayInput { message: String },

    #[error("Source preparation failed: {message}")]
    SourcePrep { message: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Encoder timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection {
            message: msg.into(),
        }
    }

    pub fn segment_extraction(index: usize, msg: impl Into<String>) -> Self {
        Self::SegmentExtraction {
            index,
            message: msg.into(),
        }
    }

    pub fn overlay_input(msg: impl Into<String>) -> Self {
        Self::OverlayInput {
            message: msg.into(),
        }
    }

    pub fn source_prep(msg: impl Into<String>) -> Self {
        Self::SourcePrep {
            message: msg.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the error ends the whole run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SegmentExtraction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_extraction_is_not_fatal() {
        let err = ReelError::segment_extraction(3, "ffmpeg exited with 1");
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Segment 3 extraction failed: ffmpeg exited with 1"
        );
    }

    #[test]
    fn test_empty_timeline_is_fatal() {
        assert!(ReelError::EmptyTimeline.is_fatal());
        assert!(ReelError::encoding("boom").is_fatal());
    }
}
