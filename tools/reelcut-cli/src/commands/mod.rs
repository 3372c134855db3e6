pub mod check;
pub mod generate;
pub mod overlay_images;
pub mod overlay_text;
pub mod prepare;
pub mod preview_text;
pub mod preview_timing;

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use reelcut_common::config::AppConfig;

/// `<output_dir>/<input stem>_<suffix>.mp4`.
pub fn default_output(config: &AppConfig, input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    config
        .paths
        .output_dir
        .join(format!("{stem}_{suffix}.mp4"))
}

/// Seeded generator when `seed` is given, entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
