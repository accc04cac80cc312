use std::path::PathBuf;

use anyhow::{Result, ensure};
use camrec_core::RecorderConfig;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "camrec-studio")]
#[command(about = "Live camera preview with GPU-shared recording")]
#[command(version)]
pub struct Args {
    /// Directory receiving one file per recording (default: ~/Videos)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Synthetic camera frame width
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Synthetic camera frame height
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Synthetic camera frame rate
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Encoder bitrate in bits per second
    #[arg(long, default_value_t = 10_000_000)]
    pub bitrate: u32,

    /// Log filter, env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "frame size must be positive, got {}x{}",
            self.width,
            self.height
        );
        ensure!(self.fps > 0, "frame rate must be positive");
        Ok(())
    }

    /// Recorder configuration for the raw sink.
    pub fn recorder_config(&self) -> RecorderConfig {
        let mut config = RecorderConfig {
            bitrate: self.bitrate,
            default_frame_rate: self.fps,
            extension: "rgba".to_string(),
            ..Default::default()
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        config
    }
}
