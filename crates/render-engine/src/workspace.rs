//! Per-run work directory for intermediate media files.

use std::path::{Path, PathBuf};

use reelcut_common::error::ReelResult;
use tempfile::TempDir;

/// Scratch directory owned by one run. Removed on drop.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create under the system temp directory.
    pub fn new() -> ReelResult<Self> {
        let dir = tempfile::Builder::new().prefix("reelcut-").tempdir()?;
        tracing::debug!(path = %dir.path().display(), "Created work directory");
        Ok(Self { dir })
    }

    /// Create under `parent`, creating `parent` if needed.
    pub fn new_in(parent: &Path) -> ReelResult<Self> {
        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix("reelcut-")
            .tempdir_in(parent)?;
        tracing::debug!(path = %dir.path().display(), "Created work directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Path of the extracted clip for segment `index`.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.file(&format!("segment_{index:04}.mp4"))
    }
}
