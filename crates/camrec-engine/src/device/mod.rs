//! GPU device + surface management.
//!
//! - [`GpuContext`]: wgpu device/queue bound to the visible surface
//! - [`SharedGpuContext`]: its sibling handle for the encoder thread
//! - [`TextureRegistry`]: texture handles resolvable from both

mod gpu;
mod registry;
mod shared;
mod surface;

pub use gpu::{GpuContext, GpuFrame, GpuInit};
pub use registry::{RegisteredTexture, STREAM_FORMAT, TextureRegistry};
pub use shared::{ContextId, SharedGpuContext};
pub use surface::SurfaceErrorAction;
