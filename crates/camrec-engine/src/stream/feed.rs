use std::fmt;
use std::sync::Arc;

use anyhow::{Result, ensure};
use camrec_core::{TextureHandle, Transform};
use parking_lot::Mutex;

/// Callback run on the producer thread after each published frame.
pub type FrameWaker = Arc<dyn Fn() + Send + Sync>;

/// One tightly packed RGBA8 camera image.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Capture time on the producer's monotonic clock.
    pub timestamp_ns: u64,
    pub transform: Transform,
}

impl CameraFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, timestamp_ns: u64) -> Result<Self> {
        ensure!(width > 0 && height > 0, "empty frame {width}x{height}");
        let expected = width as usize * height as usize * 4;
        ensure!(
            pixels.len() == expected,
            "frame {width}x{height} needs {expected} bytes, got {}",
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels,
            timestamp_ns,
            transform: Transform::IDENTITY,
        })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

#[derive(Default)]
struct Slot {
    latest: Option<(u64, CameraFrame)>,
    published: u64,
    closed: bool,
}

/// Single-entry mailbox between a capture thread and the render thread.
///
/// Publishing replaces any frame that was not latched yet.
#[derive(Default)]
pub(crate) struct FrameSlot(Mutex<Slot>);

impl FrameSlot {
    /// Returns the assigned sequence number, or `None` once closed.
    fn publish(&self, frame: CameraFrame) -> Option<u64> {
        let mut slot = self.0.lock();
        if slot.closed {
            return None;
        }
        slot.published += 1;
        let sequence = slot.published;
        slot.latest = Some((sequence, frame));
        Some(sequence)
    }

    pub(crate) fn take_latest(&self) -> Option<(u64, CameraFrame)> {
        self.0.lock().latest.take()
    }

    pub(crate) fn close(&self) {
        let mut slot = self.0.lock();
        slot.closed = true;
        slot.latest = None;
    }

    fn is_closed(&self) -> bool {
        self.0.lock().closed
    }
}

/// Producer endpoint of a [`StreamTexture`](super::StreamTexture).
///
/// Delivered to the host when a surface is created; hand it to the capture
/// thread. Once the GPU context goes away the feed closes and publishing
/// becomes a no-op, so the capture side must bind the next feed.
#[derive(Clone)]
pub struct FrameFeed {
    slot: Arc<FrameSlot>,
    texture: TextureHandle,
    waker: Option<FrameWaker>,
}

impl FrameFeed {
    pub(crate) fn new(slot: Arc<FrameSlot>, texture: TextureHandle, waker: Option<FrameWaker>) -> Self {
        Self { slot, texture, waker }
    }

    /// Publishes `frame` as the newest image. Returns `false` when the feed is closed.
    pub fn publish(&self, frame: CameraFrame) -> bool {
        match self.slot.publish(frame) {
            Some(sequence) => {
                log::trace!("published frame {sequence} to {}", self.texture);
                if let Some(wake) = &self.waker {
                    wake();
                }
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }

    /// Texture the published frames land in.
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

impl fmt::Debug for FrameFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameFeed")
            .field("texture", &self.texture)
            .field("closed", &self.is_closed())
            .finish()
    }
}
