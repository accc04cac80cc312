//! wgpu/winit collaborators for the camrec coordinator.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`device`] | `GpuContext`, `SharedGpuContext`, `TextureRegistry` |
//! | [`render`] | `WgpuBlitPipeline`, `RenderTarget` |
//! | [`stream`] | `StreamTexture`, `FrameFeed`, `CameraFrame` |
//! | [`record`] | `RawVideoSink` |
//! | [`window`] | `Runtime`, `HostEvent` |
//! | [`core`] | `HostApp`, `GpuSurfaceContext` |
//! | [`logging`] | `init_logging` |

pub mod core;
pub mod device;
pub mod logging;
pub mod record;
pub mod render;
pub mod stream;
pub mod window;
