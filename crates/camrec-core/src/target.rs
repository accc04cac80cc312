use std::path::{Path, PathBuf};

/// Immutable parameters of one recording session.
///
/// Built on the render thread at the moment recording starts and moved into the
/// encoder. `C` is the shareable GPU context handle the encoder renders from.
#[derive(Debug, Clone)]
pub struct RecordingTarget<C> {
    destination: PathBuf,
    width: u32,
    height: u32,
    frame_rate: u32,
    bitrate: u32,
    shared_context: C,
}

impl<C> RecordingTarget<C> {
    pub fn new(
        destination: PathBuf,
        (width, height): (u32, u32),
        frame_rate: u32,
        bitrate: u32,
        shared_context: C,
    ) -> Self {
        Self {
            destination,
            width,
            height,
            frame_rate,
            bitrate,
            shared_context,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Bits per second.
    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn shared_context(&self) -> &C {
        &self.shared_context
    }

    /// Consumes the target, returning the context handle.
    pub fn into_shared_context(self) -> C {
        self.shared_context
    }
}
