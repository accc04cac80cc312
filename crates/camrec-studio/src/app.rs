use camrec_core::{ControlHandle, FrameReport, ProgramKind, Transition};
use camrec_engine::core::{AppControl, HostApp};
use camrec_engine::stream::FrameFeed;
use camrec_engine::window::EngineCoordinator;
use winit::keyboard::KeyCode;

use crate::camera::SyntheticCamera;

/// Keyboard-driven preview: R records, M toggles monochrome, Escape quits.
pub struct StudioApp {
    camera: SyntheticCamera,
    controls: ControlHandle,
}

impl StudioApp {
    pub fn new(camera: SyntheticCamera, controls: ControlHandle) -> Self {
        Self { camera, controls }
    }
}

/// Program selected by the monochrome toggle.
pub fn toggled(kind: ProgramKind) -> ProgramKind {
    match kind {
        ProgramKind::Passthrough => ProgramKind::Monochrome,
        ProgramKind::Monochrome => ProgramKind::Passthrough,
    }
}

impl HostApp for StudioApp {
    fn on_frame_source(&mut self, feed: FrameFeed) {
        self.camera.bind(feed);
    }

    fn on_pausing(&mut self) {
        self.camera.unbind();
    }

    fn on_key(&mut self, key: KeyCode, coordinator: &mut EngineCoordinator) -> AppControl {
        match key {
            KeyCode::KeyR => {
                let requested = !self.controls.recording_requested();
                log::info!("recording {}", if requested { "requested" } else { "released" });
                self.controls.set_recording_requested(requested);
            }
            KeyCode::KeyM => {
                let kind = toggled(coordinator.program_kind());
                log::info!("program -> {kind:?}");
                coordinator.set_program_kind(kind);
            }
            KeyCode::Escape => return AppControl::Exit,
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, report: &FrameReport) {
        match report.transition {
            Transition::Stay => {}
            other => log::debug!("frame transition: {other:?}"),
        }
        if let Some(reason) = report.skipped {
            log::trace!("frame skipped: {reason:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monochrome_toggle_flips_both_ways() {
        assert_eq!(toggled(ProgramKind::Passthrough), ProgramKind::Monochrome);
        assert_eq!(toggled(ProgramKind::Monochrome), ProgramKind::Passthrough);
    }
}
