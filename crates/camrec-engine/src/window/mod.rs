//! Window + runtime loop.
//!
//! Owns the `winit` event loop and maps its lifecycle onto the coordinator:
//!
//! | winit | coordinator |
//! |-------|-------------|
//! | `resumed` | `on_surface_created`, `on_surface_changed` |
//! | `Resized` | `on_surface_changed` |
//! | `RedrawRequested` | `on_draw_frame` |
//! | `suspended` / `exiting` | `notify_pausing` |

mod runtime;

pub use runtime::{EngineCoordinator, HostEvent, HostProxy, Runtime, RuntimeConfig};
