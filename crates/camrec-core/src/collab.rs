//! Collaborator contracts consumed by the coordinator.
//!
//! The coordinator never talks to a GPU API or a thread directly. Everything it
//! drives goes through these traits:
//! - [`FrameSource`]: camera-fed streaming texture, latched on the render thread
//! - [`BlitPipeline`]: draws a texture (and the recording indicator) to the surface
//! - [`Encoder`]: fire-and-forget command sink into the encoder thread
//! - [`HostChannel`]: one-shot delivery of a new frame source to the host
//! - [`SurfaceContext`]: the GPU context current during a lifecycle callback

use std::fmt;

use anyhow::Result;

use crate::target::RecordingTarget;

/// Opaque identifier of a GPU-resident texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureHandle(pub u32);

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// Column-major 4x4 texture-coordinate transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform(pub [f32; 16]);

impl Transform {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Flips texture coordinates vertically (`v' = 1 - v`).
    pub const FLIP_Y: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, 1.0,
    ]);

    /// Flips texture coordinates horizontally (`u' = 1 - u`), e.g. for a front camera.
    pub const MIRROR_X: Self = Self([
        -1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        1.0, 0.0, 0.0, 1.0,
    ]);

    #[inline]
    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }

    /// Applies the transform to a texture coordinate.
    pub fn apply(&self, u: f32, v: f32) -> (f32, f32) {
        let m = &self.0;
        (
            m[0] * u + m[4] * v + m[12],
            m[1] * u + m[5] * v + m[13],
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Blit program variants a pipeline can be asked to run.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ProgramKind {
    #[default]
    Passthrough,
    Monochrome,
}

/// Metadata of the most recently latched frame, forwarded to the encoder.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStamp {
    /// Producer-assigned sequence number; `0` means nothing was latched yet.
    pub sequence: u64,
    /// Capture timestamp in nanoseconds on the producer's monotonic clock.
    pub timestamp_ns: u64,
    pub transform: Transform,
}

impl Default for FrameStamp {
    fn default() -> Self {
        Self { sequence: 0, timestamp_ns: 0, transform: Transform::IDENTITY }
    }
}

/// Axis-aligned rectangle in surface pixels, top-left origin.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OverlayRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl OverlayRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Continuously-updated image producer bound to a texture.
///
/// The producer side (capture thread) publishes frames through [`FrameSource::Feed`];
/// the render thread consumes them with [`FrameSource::latch_newest`].
pub trait FrameSource {
    /// Producer endpoint handed to the host so a capture thread can publish frames.
    type Feed: Clone + Send + 'static;

    /// Latches the newest published frame into the bound texture.
    ///
    /// When nothing newer than the previous latch exists this is a no-op and the
    /// previous image stays in place.
    fn latch_newest(&mut self) -> Result<()>;

    /// Texture-coordinate transform of the latched frame.
    fn current_transform(&self) -> Transform;

    /// Metadata of the latched frame.
    fn stamp(&self) -> FrameStamp;

    fn feed(&self) -> Self::Feed;

    fn release(&mut self);
}

/// GPU program that draws a source texture to the currently bound target.
pub trait BlitPipeline {
    /// Allocates a texture object usable as a frame source target.
    fn create_texture_handle(&mut self) -> Result<TextureHandle>;

    /// Frees a texture from [`create_texture_handle`](Self::create_texture_handle)
    /// that never reached a frame source.
    fn delete_texture_handle(&mut self, texture: TextureHandle);

    /// Informs the program of the incoming frame size (used for texel-size math).
    fn set_resize_hint(&mut self, width: u32, height: u32);

    fn draw(&mut self, texture: TextureHandle, transform: &Transform) -> Result<()>;

    /// Fills a rectangle with a solid straight-alpha RGBA color.
    fn fill_rect(&mut self, rect: OverlayRect, color: [f32; 4]) -> Result<()>;

    fn current_program_kind(&self) -> ProgramKind;

    /// Replaces the active program. The new program has not seen any resize hint.
    fn change_program(&mut self, kind: ProgramKind) -> Result<()>;

    /// Releases GPU resources.
    ///
    /// With `keep_shared_state == false` the caller asserts the owning GPU context
    /// is about to be destroyed, so shared program objects are dropped without
    /// explicit deletion.
    fn release(&mut self, keep_shared_state: bool);
}

/// Command sink into an encoder running on its own thread.
///
/// Every call is a notification; none of them waits for the encoder to act.
pub trait Encoder {
    /// Handle type through which the encoder reaches the shared GPU context.
    type Context: Clone + Send + 'static;

    fn is_recording(&self) -> bool;

    fn start_recording(&mut self, target: RecordingTarget<Self::Context>) -> Result<()>;

    fn stop_recording(&mut self) -> Result<()>;

    /// Points an already-running session at a newly created GPU context.
    fn rebind_gpu_context(&mut self, context: Self::Context) -> Result<()>;

    fn set_texture_handle(&mut self, texture: TextureHandle) -> Result<()>;

    /// Signals that a new frame was latched. Ignored by the encoder when not recording.
    fn notify_frame_available(&mut self, frame: FrameStamp) -> Result<()>;
}

/// Outbound control channel to the host's main thread.
pub trait HostChannel<F> {
    /// Delivers a freshly created frame source endpoint. Delivery is asynchronous.
    fn bind_frame_source(&self, feed: F) -> Result<()>;
}

impl<F: Send> HostChannel<F> for crossbeam_channel::Sender<F> {
    fn bind_frame_source(&self, feed: F) -> Result<()> {
        self.send(feed)
            .map_err(|_| anyhow::anyhow!("host control channel is closed"))
    }
}

/// GPU context current on the render thread during `on_surface_created`.
pub trait SurfaceContext {
    /// Shareable handle to this context, passed to the encoder.
    type Shared: Clone + Send + 'static;
    type Pipeline: BlitPipeline;
    type Source: FrameSource;

    fn shared_context(&self) -> Self::Shared;

    fn create_pipeline(&mut self, kind: ProgramKind) -> Result<Self::Pipeline>;

    fn create_frame_source(
        &mut self,
        pipeline: &mut Self::Pipeline,
        texture: TextureHandle,
    ) -> Result<Self::Source>;
}
