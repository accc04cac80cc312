//! Synthetic camera publishing a moving test pattern.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use camrec_core::ControlHandle;
use camrec_engine::stream::{CameraFrame, FrameFeed};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

#[derive(Debug, Copy, Clone)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

enum CameraCmd {
    Bind(FrameFeed),
    Unbind,
    Stop,
}

/// Capture thread handle. The thread idles until a feed is bound.
pub struct SyntheticCamera {
    tx: Sender<CameraCmd>,
    thread: Option<JoinHandle<()>>,
}

impl SyntheticCamera {
    pub fn spawn(config: CameraConfig, controls: ControlHandle) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let thread = std::thread::Builder::new()
            .name("camrec-camera".to_string())
            .spawn(move || run(config, controls, rx))
            .context("failed to spawn camera thread")?;
        Ok(Self {
            tx,
            thread: Some(thread),
        })
    }

    /// Redirects capture into `feed`.
    pub fn bind(&self, feed: FrameFeed) {
        let _ = self.tx.send(CameraCmd::Bind(feed));
    }

    /// Stops publishing until the next `bind`.
    pub fn unbind(&self) {
        let _ = self.tx.send(CameraCmd::Unbind);
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        let _ = self.tx.send(CameraCmd::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run(config: CameraConfig, controls: ControlHandle, rx: Receiver<CameraCmd>) {
    let interval = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    let epoch = Instant::now();
    let mut feed: Option<FrameFeed> = None;
    let mut tick: u32 = 0;
    let mut next = Instant::now();

    loop {
        let timeout = next.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok(CameraCmd::Bind(new_feed)) => {
                log::info!(
                    "camera streaming {}x{}@{} into {}",
                    config.width,
                    config.height,
                    config.fps,
                    new_feed.texture()
                );
                // Reported once the camera is open, like a real device.
                controls.set_incoming_size(config.width as i32, config.height as i32);
                controls.set_frame_rate(config.fps);
                feed = Some(new_feed);
                continue;
            }
            Ok(CameraCmd::Unbind) => {
                log::debug!("camera paused");
                feed = None;
                continue;
            }
            Ok(CameraCmd::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        next += interval;

        let Some(current) = &feed else {
            continue;
        };
        let pixels = test_pattern(config.width, config.height, tick);
        tick = tick.wrapping_add(1);
        let timestamp_ns = epoch.elapsed().as_nanos() as u64;
        match CameraFrame::new(config.width, config.height, pixels, timestamp_ns) {
            Ok(frame) => {
                if !current.publish(frame) {
                    log::debug!("frame source closed; waiting for a new one");
                    feed = None;
                }
            }
            Err(e) => {
                log::error!("camera produced an invalid frame: {e:#}");
                break;
            }
        }
    }
    log::debug!("camera thread exiting");
}

/// RGBA8 color bars with a bright column sweeping left to right.
pub fn test_pattern(width: u32, height: u32, tick: u32) -> Vec<u8> {
    const BARS: [[u8; 3]; 7] = [
        [192, 192, 192],
        [192, 192, 0],
        [0, 192, 192],
        [0, 192, 0],
        [192, 0, 192],
        [192, 0, 0],
        [0, 0, 192],
    ];
    let sweep = if width == 0 { 0 } else { tick.wrapping_mul(8) % width };
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for _y in 0..height {
        for x in 0..width {
            let rgb = if x.abs_diff(sweep) < 4 {
                [255, 255, 255]
            } else {
                BARS[(x as usize * BARS.len()) / width as usize]
            };
            pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(p: &[u8], width: u32, x: u32, y: u32) -> &[u8] {
        let i = ((y * width + x) * 4) as usize;
        &p[i..i + 4]
    }

    #[test]
    fn pattern_is_tightly_packed_rgba() {
        let p = test_pattern(64, 16, 0);
        assert_eq!(p.len(), 64 * 16 * 4);
        assert!(p.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn sweep_moves_with_tick() {
        let a = test_pattern(64, 2, 0);
        let b = test_pattern(64, 2, 2);
        assert_eq!(pixel(&a, 64, 0, 1), &[255, 255, 255, 255]);
        assert_ne!(pixel(&b, 64, 0, 1), &[255, 255, 255, 255]);
        assert_eq!(pixel(&b, 64, 16, 1), &[255, 255, 255, 255]);
    }

    #[test]
    fn sweep_survives_tick_wraparound() {
        let p = test_pattern(64, 1, u32::MAX);
        // u32::MAX * 8 wraps to 2^32 - 8, which is 56 modulo 64.
        assert_eq!(pixel(&p, 64, 56, 0), &[255, 255, 255, 255]);
    }

    #[test]
    fn last_column_uses_last_bar() {
        let p = test_pattern(70, 1, 0);
        assert_eq!(pixel(&p, 70, 69, 0), &[0, 0, 192, 255]);
    }
}
