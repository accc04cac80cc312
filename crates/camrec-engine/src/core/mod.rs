//! Contracts between the runtime and the application it hosts.

mod app;
mod ctx;

pub use app::{AppControl, HostApp};
pub use ctx::GpuSurfaceContext;
