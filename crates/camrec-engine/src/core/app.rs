use camrec_core::FrameReport;
use winit::keyboard::KeyCode;

use crate::stream::FrameFeed;
use crate::window::EngineCoordinator;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Host-side application driven by the runtime.
///
/// Owns the camera. All callbacks run on the event-loop thread.
pub trait HostApp {
    /// A new frame source is ready; start (or redirect) the camera into it.
    fn on_frame_source(&mut self, feed: FrameFeed);

    /// The GPU context is about to go away. Stop feeding frames before returning.
    fn on_pausing(&mut self) {}

    /// A key was pressed (repeats excluded).
    fn on_key(&mut self, key: KeyCode, coordinator: &mut EngineCoordinator) -> AppControl {
        let _ = (key, coordinator);
        AppControl::Continue
    }

    /// Called after every drawn frame.
    fn on_frame(&mut self, report: &FrameReport) {
        let _ = report;
    }
}
