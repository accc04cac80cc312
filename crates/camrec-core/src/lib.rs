//! Render-record coordination for a live camera preview.
//!
//! This crate owns the single-threaded state machine that sits between a
//! camera-fed streaming texture, an on-screen blit pipeline, and an encoder
//! running on its own thread. It has no GPU or windowing dependencies; the
//! engine crate provides wgpu/winit implementations of the collaborator traits.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`collab`] | `FrameSource`, `BlitPipeline`, `Encoder`, `HostChannel`, `SurfaceContext` |
//! | [`coordinator`] | `Coordinator`, `FrameReport` |
//! | [`state`] | `RecordingState`, `Transition` |
//! | [`geometry`] | `FrameGeometry`, `GeometryCell` |
//! | [`controls`] | `ControlHandle` (thread-safe setters) |
//! | [`target`] | `RecordingTarget` |
//! | [`indicator`] | `IndicatorStyle`, `FrameCounter` |
//! | [`encoder`] | `EncoderHandle`, `VideoSink` |
//! | [`config`] | `RecorderConfig` |
//! | [`error`] | `CoordinatorError` |

pub mod collab;
pub mod config;
pub mod controls;
pub mod coordinator;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod indicator;
pub mod state;
pub mod target;

#[cfg(test)]
mod fakes;

pub use collab::{
    BlitPipeline, Encoder, FrameSource, FrameStamp, HostChannel, OverlayRect, ProgramKind,
    SurfaceContext, TextureHandle, Transform,
};
pub use config::RecorderConfig;
pub use controls::ControlHandle;
pub use coordinator::{Coordinator, FrameReport, SkipReason};
pub use error::CoordinatorError;
pub use geometry::FrameGeometry;
pub use state::{RecordingState, Transition};
pub use target::RecordingTarget;
