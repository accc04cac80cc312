//! GPU rendering.
//!
//! Convention:
//! - Overlay geometry is in physical surface pixels (top-left origin, +Y down).
//! - Texture transforms act on bottom-left-origin coordinates; the vertex
//!   shader converts to wgpu's top-left texture space after applying them.

mod blit;
mod common;
mod ctx;

pub use blit::WgpuBlitPipeline;
pub use ctx::RenderTarget;
