//! Check external tools and configuration.

use std::path::PathBuf;

use reelcut_audio_ai::{CommandDetector, TimestampDetector};
use reelcut_common::config::{config_file_path, AppConfig};
use reelcut_render_engine::command::{check_ffmpeg, check_ffprobe};

pub fn run(config: &AppConfig, detector: Option<PathBuf>) -> anyhow::Result<()> {
    println!("ReelCut System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;
    for (name, found) in [("ffmpeg", check_ffmpeg()), ("ffprobe", check_ffprobe())] {
        match found {
            Ok(path) => println!("[OK] {name}: {}", path.display()),
            Err(_) => {
                println!("[MISSING] {name}: install it and make sure it is on PATH");
                ready = false;
            }
        }
    }

    match detector {
        Some(program) => {
            let detector = CommandDetector::new(&program);
            if detector.is_available() {
                println!("[OK] Detector: {}", program.display());
            } else {
                println!(
                    "[WARN] Detector not found: {} (generation falls back to one segment)",
                    program.display()
                );
            }
        }
        None => println!("[INFO] Detector: precomputed <audio>.<mode>.json files"),
    }

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: defaults ({} not found)", config_path.display());
    }
    match config.engine.validate() {
        Ok(()) => println!("[OK] Engine settings valid"),
        Err(e) => {
            println!("[ERROR] {e}");
            ready = false;
        }
    }
    println!("     Work dir: {}", config.paths.work_dir.display());
    println!("     Output dir: {}", config.paths.output_dir.display());

    println!();
    if ready {
        println!("All required tools are available. ReelCut is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }
    Ok(())
}
