use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::indicator::IndicatorStyle;

/// Recording configuration.
///
/// Destination, bitrate and frame rate are passed through to the encoder
/// untouched; the coordinator does not interpret them.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory receiving one file per recording session.
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub extension: String,

    /// Encoder bitrate in bits per second.
    pub bitrate: u32,

    /// Used when the camera has not reported a frame rate.
    pub default_frame_rate: u32,

    pub indicator: IndicatorStyle,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs::video_dir().unwrap_or_else(std::env::temp_dir),
            file_prefix: "VID".to_string(),
            extension: "mp4".to_string(),
            bitrate: 10_000_000,
            default_frame_rate: 30,
            indicator: IndicatorStyle::default(),
        }
    }
}

impl RecorderConfig {
    /// Destination for a session started at `at`:
    /// `<output_dir>/<prefix>_yyyy_MM_dd_HH_mm_ss_SSS.<ext>`.
    pub fn destination_for(&self, at: NaiveDateTime) -> PathBuf {
        let stamp = at.format("%Y_%m_%d_%H_%M_%S_%3f");
        self.output_dir
            .join(format!("{}_{}.{}", self.file_prefix, stamp, self.extension))
    }

    /// Destination for a session starting now (local time).
    pub fn next_destination(&self) -> PathBuf {
        self.destination_for(chrono::Local::now().naive_local())
    }

    pub fn effective_frame_rate(&self, reported: u32) -> u32 {
        if reported > 0 { reported } else { self.default_frame_rate }
    }

    /// Creates the output directory if needed.
    pub fn prepare_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("failed to create output directory {}", self.output_dir.display())
        })
    }
}
