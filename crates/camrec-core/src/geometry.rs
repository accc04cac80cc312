//! Incoming frame geometry with a consume-once change flag.
//!
//! Written from any thread (camera setup, display notifications), read by the
//! render thread. Width and height are packed into one atomic word so a reader
//! never observes a torn pair.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Sentinel dimension for "not known yet".
pub const UNKNOWN_DIMENSION: i32 = -1;

/// Snapshot of the camera frame geometry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameGeometry {
    pub width: i32,
    pub height: i32,
    /// Frames per second; `0` when not reported.
    pub frame_rate: u32,
}

impl FrameGeometry {
    pub const UNKNOWN: Self = Self {
        width: UNKNOWN_DIMENSION,
        height: UNKNOWN_DIMENSION,
        frame_rate: 0,
    };

    /// Both dimensions are positive.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// `(width, height)` as unsigned, or `None` while unknown.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.is_known()
            .then(|| (self.width as u32, self.height as u32))
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[inline]
fn pack(width: i32, height: i32) -> u64 {
    ((width as u32 as u64) << 32) | (height as u32 as u64)
}

#[inline]
fn unpack(word: u64) -> (i32, i32) {
    ((word >> 32) as u32 as i32, word as u32 as i32)
}

/// Single-writer/single-reader geometry slot.
#[derive(Debug)]
pub struct GeometryCell {
    size: AtomicU64,
    frame_rate: AtomicU32,
    changed: AtomicBool,
}

impl GeometryCell {
    pub fn new() -> Self {
        Self {
            size: AtomicU64::new(pack(UNKNOWN_DIMENSION, UNKNOWN_DIMENSION)),
            frame_rate: AtomicU32::new(0),
            changed: AtomicBool::new(false),
        }
    }

    /// Records a new frame size. Raises the change flag only if the size differs.
    pub fn set_size(&self, width: i32, height: i32) {
        let new = pack(width, height);
        let old = self.size.swap(new, Ordering::AcqRel);
        if old != new {
            self.changed.store(true, Ordering::Release);
        }
    }

    /// Frame rate does not affect the resize hint, so it never raises the change flag.
    pub fn set_frame_rate(&self, frame_rate: u32) {
        self.frame_rate.store(frame_rate, Ordering::Release);
    }

    pub fn snapshot(&self) -> FrameGeometry {
        let (width, height) = unpack(self.size.load(Ordering::Acquire));
        FrameGeometry {
            width,
            height,
            frame_rate: self.frame_rate.load(Ordering::Acquire),
        }
    }

    /// Returns whether the size changed since the last call, clearing the flag.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Forces the next `take_changed` to report a change.
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }

    /// Forgets the size so the next creation cycle starts clean.
    pub fn reset_size(&self) {
        self.size
            .store(pack(UNKNOWN_DIMENSION, UNKNOWN_DIMENSION), Ordering::Release);
    }
}

impl Default for GeometryCell {
    fn default() -> Self {
        Self::new()
    }
}
