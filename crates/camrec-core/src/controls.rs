use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::geometry::{FrameGeometry, GeometryCell};

#[derive(Debug, Default)]
struct Controls {
    recording_requested: AtomicBool,
    geometry: GeometryCell,
}

/// Thread-safe inbound mutators for the coordinator.
///
/// Setters only store values; the coordinator samples them at the next drawn
/// frame. Toggles between two draws coalesce into the last written value.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    inner: Arc<Controls>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_recording_requested(&self, requested: bool) {
        let was = self
            .inner
            .recording_requested
            .swap(requested, Ordering::AcqRel);
        if was != requested {
            log::debug!("recording requested: was {was} now {requested}");
        }
    }

    pub fn recording_requested(&self) -> bool {
        self.inner.recording_requested.load(Ordering::Acquire)
    }

    /// Records the size of the incoming camera frames.
    ///
    /// May arrive before or after the surface is created.
    pub fn set_incoming_size(&self, width: i32, height: i32) {
        log::debug!("incoming frame size {width}x{height}");
        self.inner.geometry.set_size(width, height);
    }

    pub fn set_frame_rate(&self, frame_rate: u32) {
        self.inner.geometry.set_frame_rate(frame_rate);
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.inner.geometry.snapshot()
    }

    pub(crate) fn cell(&self) -> &GeometryCell {
        &self.inner.geometry
    }
}
