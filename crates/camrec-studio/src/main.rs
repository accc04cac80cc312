mod app;
mod camera;
mod cli;

use anyhow::{Context, Result};
use camrec_core::ControlHandle;
use camrec_core::encoder::EncoderHandle;
use camrec_engine::device::GpuInit;
use camrec_engine::logging::{LoggingConfig, init_logging};
use camrec_engine::record::RawVideoSink;
use camrec_engine::window::{Runtime, RuntimeConfig};
use clap::Parser;
use winit::dpi::LogicalSize;

use crate::app::StudioApp;
use crate::camera::{CameraConfig, SyntheticCamera};
use crate::cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    let recorder = args.recorder_config();
    recorder.prepare_output_dir()?;
    log::info!("recordings go to {}", recorder.output_dir.display());

    let controls = ControlHandle::new();
    let camera = SyntheticCamera::spawn(
        CameraConfig {
            width: args.width,
            height: args.height,
            fps: args.fps,
        },
        controls.clone(),
    )?;
    let encoder =
        EncoderHandle::spawn(RawVideoSink::new()).context("failed to start encoder")?;

    let config = RuntimeConfig {
        title: "camrec studio".to_string(),
        initial_size: LogicalSize::new(args.width as f64, args.height as f64),
    };
    let app = StudioApp::new(camera, controls.clone());

    Runtime::run(config, GpuInit::default(), recorder, controls, encoder, app)
}
