//! The render-record coordinator.
//!
//! All entry points run on the render thread and are never invoked
//! concurrently; `&mut self` on every callback enforces that. Other threads only
//! reach the coordinator through [`ControlHandle`] setters, which are sampled at
//! the next drawn frame.
//!
//! Per-frame ordering (`on_draw_frame`):
//! 1. latch the newest camera frame
//! 2. run the recording state machine
//! 3. hand the texture handle to the encoder
//! 4. notify the encoder that a frame is available
//! 5. skip the visible draw while the frame size is unknown
//! 6. swap the blit program if another kind was selected
//! 7. push a pending resize hint
//! 8. draw the texture to the surface
//! 9. blink the recording indicator (on screen only)

use crate::collab::{
    BlitPipeline, Encoder, FrameSource, HostChannel, ProgramKind, SurfaceContext, TextureHandle,
};
use crate::config::RecorderConfig;
use crate::controls::ControlHandle;
use crate::error::CoordinatorError;
use crate::indicator::FrameCounter;
use crate::state::{self, RecordingState, Transition};
use crate::target::RecordingTarget;

/// Resources bound to one GPU context. Present iff the context is alive.
struct SurfaceResources<P, S, C> {
    pipeline: P,
    source: S,
    texture: TextureHandle,
    context: C,
    /// Size last pushed to this pipeline's resize hint.
    hinted: Option<(u32, u32)>,
}

impl<P: BlitPipeline, S: FrameSource, C> SurfaceResources<P, S, C> {
    fn release(mut self) {
        self.source.release();
        // The owning context is torn down right after; don't delete shared program state.
        self.pipeline.release(false);
    }
}

/// Why the visible part of a frame was not drawn.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    /// No GPU context / frame source is bound.
    NoSurface,
    /// Incoming frame size is not known yet.
    GeometryUnknown,
}

/// Outcome of one `on_draw_frame` call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameReport {
    /// Encoder command issued by the state machine this frame.
    pub transition: Transition,
    pub skipped: Option<SkipReason>,
    /// Size pushed to the pipeline's resize hint this frame.
    pub resize_hint: Option<(u32, u32)>,
    pub indicator: bool,
}

impl FrameReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            transition: Transition::Stay,
            skipped: Some(reason),
            resize_hint: None,
            indicator: false,
        }
    }

    #[inline]
    pub fn drawn(&self) -> bool {
        self.skipped.is_none()
    }
}

/// Owns the recording state machine and the per-context preview resources.
pub struct Coordinator<P, S, E, H>
where
    P: BlitPipeline,
    S: FrameSource,
    E: Encoder,
    H: HostChannel<S::Feed>,
{
    config: RecorderConfig,
    controls: ControlHandle,
    encoder: E,
    host: H,

    surface: Option<SurfaceResources<P, S, E::Context>>,
    /// `None` until the first surface is created.
    state: Option<RecordingState>,
    counter: FrameCounter,
    program: ProgramKind,
    surface_size: Option<(u32, u32)>,
}

impl<P, S, E, H> Coordinator<P, S, E, H>
where
    P: BlitPipeline,
    S: FrameSource,
    E: Encoder,
    H: HostChannel<S::Feed>,
{
    pub fn new(config: RecorderConfig, encoder: E, host: H) -> Self {
        Self::with_controls(config, ControlHandle::new(), encoder, host)
    }

    /// Creates a coordinator sampling an existing control handle.
    pub fn with_controls(
        config: RecorderConfig,
        controls: ControlHandle,
        encoder: E,
        host: H,
    ) -> Self {
        Self {
            config,
            controls,
            encoder,
            host,
            surface: None,
            state: None,
            counter: FrameCounter::default(),
            program: ProgramKind::default(),
            surface_size: None,
        }
    }

    /// Handle for the thread-safe "recording requested" and geometry setters.
    pub fn controls(&self) -> ControlHandle {
        self.controls.clone()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn recording_state(&self) -> Option<RecordingState> {
        self.state
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Preview texture of the live context.
    pub fn texture(&self) -> Option<TextureHandle> {
        self.surface.as_ref().map(|s| s.texture)
    }

    /// Blit pipeline of the live context.
    pub fn pipeline_mut(&mut self) -> Option<&mut P> {
        self.surface.as_mut().map(|s| &mut s.pipeline)
    }

    /// Last size reported through `on_surface_changed`.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    pub fn program_kind(&self) -> ProgramKind {
        self.program
    }

    /// Selects the blit program; applied at the next drawn frame.
    pub fn set_program_kind(&mut self, kind: ProgramKind) {
        if self.program != kind {
            log::debug!("program kind {:?} -> {kind:?}", self.program);
            self.program = kind;
        }
    }

    /// A new GPU context is current on the render thread.
    pub fn on_surface_created<X>(&mut self, ctx: &mut X) -> Result<(), CoordinatorError>
    where
        X: SurfaceContext<Pipeline = P, Source = S, Shared = E::Context>,
    {
        log::debug!("surface created");

        if let Some(stale) = self.surface.take() {
            log::warn!("surface created while previous resources are alive; releasing them");
            stale.release();
        }

        // A session may have survived the previous context (pause/resume).
        let recording = self.encoder.is_recording();
        let initial = RecordingState::initial(recording);
        log::debug!("encoder recording: {recording}; initial state {initial:?}");
        self.state = Some(initial);

        let mut pipeline = ctx
            .create_pipeline(self.program)
            .map_err(CoordinatorError::collaborator("create blit pipeline"))?;
        let texture = match pipeline.create_texture_handle() {
            Ok(texture) => texture,
            Err(e) => {
                // The context stays current; free what was built so far.
                pipeline.release(true);
                return Err(CoordinatorError::collaborator("create preview texture")(e));
            }
        };
        let source = match ctx.create_frame_source(&mut pipeline, texture) {
            Ok(source) => source,
            Err(e) => {
                pipeline.delete_texture_handle(texture);
                pipeline.release(true);
                return Err(CoordinatorError::collaborator("create frame source")(e));
            }
        };
        let feed = source.feed();

        self.surface = Some(SurfaceResources {
            pipeline,
            source,
            texture,
            context: ctx.shared_context(),
            hinted: None,
        });

        // The new pipeline has never seen a resize hint.
        self.controls.cell().mark_changed();

        // The frame source goes to the host's control thread; it owns the camera.
        self.host
            .bind_frame_source(feed)
            .map_err(CoordinatorError::collaborator("bind frame source"))
    }

    /// The visible surface changed size.
    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        log::debug!("surface changed {width}x{height}");
        self.surface_size = Some((width, height));
    }

    /// The host is about to destroy the GPU context.
    ///
    /// Call after the camera stopped feeding frames.
    pub fn notify_pausing(&mut self) {
        if let Some(surface) = self.surface.take() {
            log::debug!("pausing; releasing frame source and pipeline");
            surface.release();
        }
        self.controls.cell().reset_size();
    }

    /// Runs one frame. See the module docs for the step ordering.
    pub fn on_draw_frame(&mut self) -> Result<FrameReport, CoordinatorError> {
        let Some(surface) = self.surface.as_mut() else {
            log::trace!("draw without a bound frame source; skipping");
            return Ok(FrameReport::skipped(SkipReason::NoSurface));
        };

        surface
            .source
            .latch_newest()
            .map_err(CoordinatorError::collaborator("latch frame"))?;

        let requested = self.controls.recording_requested();
        let (transition, next) = state::step(self.state, requested)?;
        let transition = match transition {
            Transition::Start => {
                let geometry = self.controls.geometry();
                match geometry.size() {
                    Some(size) => {
                        let target = RecordingTarget::new(
                            self.config.next_destination(),
                            size,
                            self.config.effective_frame_rate(geometry.frame_rate),
                            self.config.bitrate,
                            surface.context.clone(),
                        );
                        log::info!(
                            "START recording {}x{}@{} -> {}",
                            target.width(),
                            target.height(),
                            target.frame_rate(),
                            target.destination().display()
                        );
                        self.encoder
                            .start_recording(target)
                            .map_err(CoordinatorError::collaborator("start recording"))?;
                        self.state = Some(next);
                        Transition::Start
                    }
                    None => {
                        log::debug!("recording requested before frame size is known; deferring start");
                        Transition::Stay
                    }
                }
            }
            Transition::Rebind => {
                log::info!("RESUME recording");
                self.encoder
                    .rebind_gpu_context(surface.context.clone())
                    .map_err(CoordinatorError::collaborator("rebind gpu context"))?;
                self.state = Some(next);
                Transition::Rebind
            }
            Transition::Stop => {
                log::info!("STOP recording");
                self.encoder
                    .stop_recording()
                    .map_err(CoordinatorError::collaborator("stop recording"))?;
                self.state = Some(next);
                Transition::Stop
            }
            Transition::Stay => Transition::Stay,
        };

        // Repeated every frame: the latch above must precede the encoder's use
        // of the texture, and nothing else orders the two threads.
        self.encoder
            .set_texture_handle(surface.texture)
            .map_err(CoordinatorError::collaborator("set texture handle"))?;
        self.encoder
            .notify_frame_available(surface.source.stamp())
            .map_err(CoordinatorError::collaborator("notify frame available"))?;

        let mut report = FrameReport {
            transition,
            skipped: None,
            resize_hint: None,
            indicator: false,
        };

        let Some(size) = self.controls.geometry().size() else {
            // Expected briefly after geometry changes (display power cycles etc).
            log::debug!("drawing before incoming frame size is set; skipping");
            report.skipped = Some(SkipReason::GeometryUnknown);
            return Ok(report);
        };

        if surface.pipeline.current_program_kind() != self.program {
            surface
                .pipeline
                .change_program(self.program)
                .map_err(CoordinatorError::collaborator("change program"))?;
            surface.hinted = None;
            self.controls.cell().mark_changed();
        }

        if self.controls.cell().take_changed() {
            // Re-read: the size may have been replaced between the guard and the swap.
            let size = self.controls.geometry().size().unwrap_or(size);
            if surface.hinted != Some(size) {
                surface.pipeline.set_resize_hint(size.0, size.1);
                surface.hinted = Some(size);
                report.resize_hint = Some(size);
            }
        }

        let transform = surface.source.current_transform();
        surface
            .pipeline
            .draw(surface.texture, &transform)
            .map_err(CoordinatorError::collaborator("draw frame"))?;

        if self.state == Some(RecordingState::On) {
            let tick = self.counter.advance();
            let style = &self.config.indicator;
            if style.visible_at(tick) {
                surface
                    .pipeline
                    .fill_rect(style.rect, style.color)
                    .map_err(CoordinatorError::collaborator("draw indicator"))?;
                report.indicator = true;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::collab::OverlayRect;
    use crate::fakes::{Call, CallLog, FakeEncoder, FakeFeed, FakeHost, FakePipeline, FakeSource, FakeSurface};

    type TestCoordinator = Coordinator<FakePipeline, FakeSource, FakeEncoder, FakeHost>;

    fn rig() -> (TestCoordinator, CallLog) {
        let log = CallLog::default();
        let config = RecorderConfig {
            output_dir: PathBuf::from("/tmp/camrec-tests"),
            ..Default::default()
        };
        let coord = Coordinator::new(config, FakeEncoder::new(log.clone()), FakeHost::new(log.clone()));
        (coord, log)
    }

    /// Coordinator with a live surface (context id 1), known 640x480@30 geometry,
    /// and the creation calls drained from the log.
    fn ready() -> (TestCoordinator, CallLog) {
        let (mut coord, log) = rig();
        coord.controls().set_incoming_size(640, 480);
        coord.controls().set_frame_rate(30);
        coord.on_surface_created(&mut FakeSurface::new(1, &log)).unwrap();
        log.take();
        (coord, log)
    }

    fn is_start(c: &Call) -> bool {
        matches!(c, Call::Start { .. })
    }

    fn is_draw(c: &Call) -> bool {
        matches!(c, Call::Draw(_))
    }

    fn is_hint(c: &Call) -> bool {
        matches!(c, Call::ResizeHint(..))
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn draw_without_surface_is_a_transient_skip() {
        let (mut coord, log) = rig();
        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.skipped, Some(SkipReason::NoSurface));
        assert!(log.take().is_empty());
    }

    #[test]
    fn surface_created_builds_resources_and_binds_source() {
        let (mut coord, log) = rig();
        coord.on_surface_created(&mut FakeSurface::new(1, &log)).unwrap();

        assert_eq!(
            log.take(),
            vec![Call::CreatePipeline(1), Call::CreateTexture(TextureHandle(11)), Call::Bind(TextureHandle(11))]
        );
        assert_eq!(coord.texture(), Some(TextureHandle(11)));
        assert_eq!(coord.recording_state(), Some(RecordingState::Off));
    }

    #[test]
    fn pipeline_failure_propagates_without_binding() {
        let (mut coord, log) = rig();
        let mut surface = FakeSurface::new(1, &log);
        surface.fail_pipeline = true;

        let err = coord.on_surface_created(&mut surface).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(log.count(|c| matches!(c, Call::Bind(_))), 0);
        assert_eq!(coord.texture(), None);
    }

    #[test]
    fn frame_source_failure_frees_texture_and_pipeline() {
        let (mut coord, log) = rig();
        let mut surface = FakeSurface::new(1, &log);
        surface.fail_source = true;

        let err = coord.on_surface_created(&mut surface).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(
            log.take(),
            vec![
                Call::CreatePipeline(1),
                Call::CreateTexture(TextureHandle(11)),
                Call::DeleteTexture(TextureHandle(11)),
                Call::ReleasePipeline(true),
            ]
        );
        assert_eq!(coord.texture(), None);
    }

    #[test]
    fn surface_changed_is_recorded_only() {
        let (mut coord, log) = ready();
        coord.on_surface_changed(1080, 1920);
        assert_eq!(coord.surface_size(), Some((1080, 1920)));
        assert!(log.take().is_empty());
    }

    #[test]
    fn pausing_releases_resources_and_forgets_geometry() {
        let (mut coord, log) = ready();
        coord.notify_pausing();

        assert_eq!(log.take(), vec![Call::ReleaseSource, Call::ReleasePipeline(false)]);
        assert!(!coord.controls().geometry().is_known());
        assert_eq!(coord.on_draw_frame().unwrap().skipped, Some(SkipReason::NoSurface));
    }

    #[test]
    fn recreating_surface_without_pause_releases_previous() {
        let (mut coord, log) = ready();
        coord.on_surface_created(&mut FakeSurface::new(2, &log)).unwrap();
        let calls = log.take();
        assert_eq!(&calls[..2], &[Call::ReleaseSource, Call::ReleasePipeline(false)]);
        assert_eq!(coord.texture(), Some(TextureHandle(21)));
    }

    // ── per-frame ordering ────────────────────────────────────────────────

    #[test]
    fn frame_steps_run_in_order() {
        let (mut coord, log) = ready();
        coord.controls().set_recording_requested(true);
        let report = coord.on_draw_frame().unwrap();

        let tex = TextureHandle(11);
        assert_eq!(
            log.take(),
            vec![
                Call::Latch,
                Call::Start { width: 640, height: 480, frame_rate: 30, bitrate: 10_000_000, context: 1 },
                Call::SetTexture(tex),
                Call::FrameAvailable(1),
                Call::ResizeHint(640, 480),
                Call::Draw(tex),
                Call::Fill(OverlayRect::new(0, 0, 100, 100)),
            ]
        );
        assert_eq!(report.transition, Transition::Start);
        assert_eq!(report.resize_hint, Some((640, 480)));
        assert!(report.indicator);
    }

    #[test]
    fn encoder_is_notified_every_frame_even_when_idle() {
        let (mut coord, log) = ready();
        for _ in 0..3 {
            coord.on_draw_frame().unwrap();
        }
        assert_eq!(log.count(|c| matches!(c, Call::SetTexture(_))), 3);
        assert_eq!(log.count(|c| matches!(c, Call::FrameAvailable(_))), 3);
    }

    // ── geometry guard ────────────────────────────────────────────────────

    #[test]
    fn no_visible_draw_while_geometry_unknown_in_any_state() {
        let (mut coord, log) = rig();
        coord.on_surface_created(&mut FakeSurface::new(1, &log)).unwrap();

        // Off
        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.skipped, Some(SkipReason::GeometryUnknown));

        // On: get there with known geometry, then lose it.
        coord.controls().set_incoming_size(320, 240);
        coord.controls().set_recording_requested(true);
        coord.on_draw_frame().unwrap();
        assert_eq!(coord.recording_state(), Some(RecordingState::On));
        coord.controls().set_incoming_size(0, 0);
        log.take();

        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.skipped, Some(SkipReason::GeometryUnknown));
        let calls = log.take();
        assert!(!calls.iter().any(|c| is_draw(c) || is_hint(c) || matches!(c, Call::Fill(_))));
        assert!(calls.contains(&Call::FrameAvailable(3)));
    }

    #[test]
    fn start_is_deferred_until_geometry_known() {
        let (mut coord, log) = rig();
        coord.on_surface_created(&mut FakeSurface::new(1, &log)).unwrap();
        coord.controls().set_recording_requested(true);

        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.transition, Transition::Stay);
        assert_eq!(coord.recording_state(), Some(RecordingState::Off));

        coord.controls().set_incoming_size(800, 600);
        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.transition, Transition::Start);
        assert_eq!(log.count(is_start), 1);
    }

    #[test]
    fn resize_hint_is_pushed_once_per_distinct_value() {
        let (mut coord, log) = ready();
        for _ in 0..5 {
            coord.on_draw_frame().unwrap();
        }
        coord.controls().set_incoming_size(640, 480);
        coord.on_draw_frame().unwrap();
        assert_eq!(log.count(is_hint), 1);

        coord.controls().set_incoming_size(1280, 720);
        coord.on_draw_frame().unwrap();
        coord.on_draw_frame().unwrap();
        assert_eq!(
            log.take().into_iter().filter(is_hint).collect::<Vec<_>>(),
            vec![Call::ResizeHint(640, 480), Call::ResizeHint(1280, 720)]
        );
    }

    #[test]
    fn program_change_re_pushes_resize_hint() {
        let (mut coord, log) = ready();
        coord.on_draw_frame().unwrap();
        coord.set_program_kind(ProgramKind::Monochrome);
        coord.on_draw_frame().unwrap();
        coord.on_draw_frame().unwrap();

        let calls = log.take();
        assert_eq!(calls.iter().filter(|c| is_hint(c)).count(), 2);
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::ChangeProgram(_))).count(),
            1
        );
    }

    #[test]
    fn pause_resume_cycle_needs_fresh_geometry() {
        let (mut coord, log) = ready();
        coord.on_draw_frame().unwrap();
        coord.notify_pausing();
        coord.on_surface_created(&mut FakeSurface::new(2, &log)).unwrap();
        log.take();

        assert_eq!(coord.on_draw_frame().unwrap().skipped, Some(SkipReason::GeometryUnknown));
        coord.controls().set_incoming_size(640, 480);
        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.resize_hint, Some((640, 480)));
        assert!(log.take().contains(&Call::Draw(TextureHandle(21))));
    }

    // ── recording state machine ───────────────────────────────────────────

    #[test]
    fn scenario_a_start_with_current_geometry_and_context() {
        let (mut coord, log) = ready();
        assert_eq!(coord.recording_state(), Some(RecordingState::Off));

        coord.controls().set_recording_requested(true);
        coord.on_draw_frame().unwrap();

        assert_eq!(coord.recording_state(), Some(RecordingState::On));
        let starts: Vec<_> = log.take().into_iter().filter(is_start).collect();
        assert_eq!(
            starts,
            vec![Call::Start { width: 640, height: 480, frame_rate: 30, bitrate: 10_000_000, context: 1 }]
        );
    }

    #[test]
    fn scenario_b_resume_rebinds_without_starting() {
        let (mut coord, log) = rig();
        coord.controls().set_incoming_size(640, 480);
        coord.encoder.recording.store(true, Ordering::Release);

        coord.on_surface_created(&mut FakeSurface::new(7, &log)).unwrap();
        assert_eq!(coord.recording_state(), Some(RecordingState::Resumed));

        coord.controls().set_recording_requested(true);
        let report = coord.on_draw_frame().unwrap();

        assert_eq!(report.transition, Transition::Rebind);
        assert_eq!(coord.recording_state(), Some(RecordingState::On));
        assert_eq!(log.count(is_start), 0);
        assert_eq!(log.count(|c| *c == Call::Rebind(7)), 1);
    }

    #[test]
    fn resumed_without_request_stops() {
        let (mut coord, log) = rig();
        coord.controls().set_incoming_size(640, 480);
        coord.encoder.recording.store(true, Ordering::Release);
        coord.on_surface_created(&mut FakeSurface::new(3, &log)).unwrap();

        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.transition, Transition::Stop);
        assert_eq!(coord.recording_state(), Some(RecordingState::Off));
        assert_eq!(log.count(|c| *c == Call::Stop), 1);
        assert_eq!(log.count(|c| matches!(c, Call::Rebind(_))), 0);
    }

    #[test]
    fn scenario_c_toggles_between_frames_coalesce() {
        // Final value false: exactly one stop.
        let (mut coord, log) = ready();
        coord.controls().set_recording_requested(true);
        coord.on_draw_frame().unwrap();
        log.take();

        for v in [false, true, false, true, false] {
            coord.controls().set_recording_requested(v);
        }
        coord.on_draw_frame().unwrap();
        let calls = log.take();
        assert_eq!(calls.iter().filter(|c| **c == Call::Stop).count(), 1);
        assert!(!calls.iter().any(is_start));

        // Final value true: nothing happens.
        coord.controls().set_recording_requested(true);
        coord.on_draw_frame().unwrap();
        log.take();
        for v in [false, true, false, true] {
            coord.controls().set_recording_requested(v);
        }
        let report = coord.on_draw_frame().unwrap();
        assert_eq!(report.transition, Transition::Stay);
        let calls = log.take();
        assert!(!calls.iter().any(|c| is_start(c) || *c == Call::Stop));
    }

    #[test]
    fn scenario_d_zero_then_real_geometry_pushes_once() {
        let (mut coord, log) = rig();
        coord.controls().set_incoming_size(0, 0);
        coord.controls().set_incoming_size(640, 480);
        coord.on_surface_created(&mut FakeSurface::new(1, &log)).unwrap();

        for _ in 0..4 {
            let report = coord.on_draw_frame().unwrap();
            assert!(report.drawn());
        }
        let hints: Vec<_> = log.take().into_iter().filter(is_hint).collect();
        assert_eq!(hints, vec![Call::ResizeHint(640, 480)]);
    }

    #[test]
    fn one_command_per_edge_for_any_toggle_sequence() {
        let (mut coord, log) = ready();

        // xorshift sequence of requested values, several per frame.
        let mut x: u32 = 0x9e37_79b9;
        let mut edges_on = 0;
        let mut edges_off = 0;
        let mut last = false;
        for _ in 0..500 {
            for _ in 0..(x % 3) {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                coord.controls().set_recording_requested(x & 1 == 1);
            }
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;

            let now = coord.controls().recording_requested();
            if now && !last {
                edges_on += 1;
            }
            if !now && last {
                edges_off += 1;
            }
            last = now;
            coord.on_draw_frame().unwrap();
        }

        assert!(edges_on > 0);
        assert_eq!(log.count(is_start), edges_on);
        assert_eq!(log.count(|c| *c == Call::Stop), edges_off);
    }

    #[test]
    fn failed_start_propagates_and_keeps_state_off() {
        let (mut coord, log) = ready();
        coord.encoder.fail_start = true;
        coord.controls().set_recording_requested(true);

        let err = coord.on_draw_frame().unwrap_err();
        assert!(matches!(err, CoordinatorError::Collaborator { operation: "start recording", .. }));
        assert!(!err.is_fatal());
        assert_eq!(coord.recording_state(), Some(RecordingState::Off));
        assert_eq!(log.count(is_draw), 0);
    }

    // ── indicator ─────────────────────────────────────────────────────────

    #[test]
    fn indicator_blinks_only_while_recording() {
        let (mut coord, log) = ready();
        for _ in 0..8 {
            assert!(!coord.on_draw_frame().unwrap().indicator);
        }

        coord.controls().set_recording_requested(true);
        let shown: Vec<bool> = (0..8)
            .map(|_| coord.on_draw_frame().unwrap().indicator)
            .collect();
        // ticks 1..=8 with mask 0b100
        assert_eq!(shown, vec![true, true, true, false, false, false, false, true]);
        assert_eq!(log.count(|c| matches!(c, Call::Fill(_))), 4);
    }

    #[test]
    fn host_receives_feed_for_new_texture() {
        let (tx, rx) = crossbeam_channel::unbounded::<FakeFeed>();
        let log = CallLog::default();
        let mut coord: Coordinator<FakePipeline, FakeSource, FakeEncoder, _> =
            Coordinator::new(RecorderConfig::default(), FakeEncoder::new(log.clone()), tx);

        coord.on_surface_created(&mut FakeSurface::new(4, &log)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), FakeFeed(TextureHandle(41)));
        assert!(rx.try_recv().is_err());
    }
}
