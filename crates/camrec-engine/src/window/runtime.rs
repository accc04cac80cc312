use std::sync::Arc;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use camrec_core::encoder::EncoderHandle;
use camrec_core::{ControlHandle, Coordinator, CoordinatorError, HostChannel, RecorderConfig};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::core::{AppControl, GpuSurfaceContext, HostApp};
use crate::device::{GpuContext, GpuInit, SharedGpuContext};
use crate::render::{RenderTarget, WgpuBlitPipeline};
use crate::stream::{FrameFeed, FrameWaker, StreamTexture};

/// The coordinator as hosted by [`Runtime`].
pub type EngineCoordinator =
    Coordinator<WgpuBlitPipeline, StreamTexture, EncoderHandle<SharedGpuContext>, HostProxy>;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "camrec".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Events posted into the event loop from other threads.
#[derive(Debug)]
pub enum HostEvent {
    /// A new frame source was created on the render side.
    BindFrameSource(FrameFeed),
    /// The capture thread published a frame.
    FrameAvailable,
}

/// [`HostChannel`] delivering frame sources through the event-loop proxy.
#[derive(Clone)]
pub struct HostProxy(EventLoopProxy<HostEvent>);

impl HostChannel<FrameFeed> for HostProxy {
    fn bind_frame_source(&self, feed: FrameFeed) -> Result<()> {
        self.0
            .send_event(HostEvent::BindFrameSource(feed))
            .map_err(|_| anyhow::anyhow!("event loop is closed"))
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the preview window until it closes or a fatal coordinator error occurs.
    ///
    /// `controls` is the handle the camera and UI use to report geometry and
    /// request recording.
    pub fn run<A>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        recorder: RecorderConfig,
        controls: ControlHandle,
        encoder: EncoderHandle<SharedGpuContext>,
        app: A,
    ) -> Result<()>
    where
        A: HostApp + 'static,
    {
        let event_loop = EventLoop::<HostEvent>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;
        let proxy = event_loop.create_proxy();

        let coordinator = Coordinator::with_controls(
            recorder,
            controls,
            encoder,
            HostProxy(proxy.clone()),
        );
        let mut state = AppState::new(config, gpu_init, coordinator, proxy, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(anyhow::Error::new(err).context("render coordination failed")),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: GpuContext<'this>,
}

struct AppState<A: HostApp> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    coordinator: EngineCoordinator,
    proxy: EventLoopProxy<HostEvent>,
    app: A,

    /// Present between `resumed` and `suspended`.
    entry: Option<WindowEntry>,
    fatal: Option<CoordinatorError>,
    exit_requested: bool,
}

impl<A: HostApp> AppState<A> {
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        coordinator: EngineCoordinator,
        proxy: EventLoopProxy<HostEvent>,
        app: A,
    ) -> Self {
        Self {
            config,
            gpu_init,
            coordinator,
            proxy,
            app,
            entry: None,
            fatal: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    /// Logs a coordinator error; fatal ones end the event loop.
    fn check(&mut self, event_loop: &ActiveEventLoop, result: Result<(), CoordinatorError>) {
        let Err(err) = result else {
            return;
        };
        if err.is_fatal() {
            log::error!("fatal: {err}");
            self.fatal = Some(err);
            self.request_exit(event_loop);
        } else {
            log::error!("{:#}", anyhow::Error::new(err));
        }
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntry::try_new(window, |w| {
            pollster::block_on(GpuContext::new(w, gpu_init))
        })?;

        self.entry = Some(entry);
        Ok(())
    }

    /// Releases render resources and destroys the window + GPU context.
    fn pause(&mut self) {
        if self.entry.is_none() {
            return;
        }
        self.app.on_pausing();
        self.coordinator.notify_pausing();
        self.entry = None;
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        let (coordinator, app) = (&mut self.coordinator, &mut self.app);
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let mut surface_fatal = false;
        let result = entry.with_mut(|fields| {
            let mut frame = match fields.gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    if fields.gpu.handle_surface_error(err).is_fatal() {
                        surface_fatal = true;
                    }
                    fields.window.request_redraw();
                    return Ok(());
                }
            };

            let result = coordinator.on_draw_frame().map(|report| app.on_frame(&report));

            let size = fields.gpu.size();
            if let Some(pipeline) = coordinator.pipeline_mut() {
                let mut target =
                    RenderTarget::new(&mut frame.encoder, &frame.view, (size.width, size.height));
                pipeline.encode(&mut target);
            }

            fields.window.pre_present_notify();
            fields.gpu.submit(frame);
            result
        });

        if surface_fatal {
            log::error!("surface is unusable; exiting");
            self.request_exit(event_loop);
        }
        self.check(event_loop, result);
    }

    fn waker(&self) -> FrameWaker {
        let proxy = self.proxy.clone();
        Arc::new(move || {
            // Loop closed: nobody is left to draw.
            let _ = proxy.send_event(HostEvent::FrameAvailable);
        })
    }
}

impl<A: HostApp> ApplicationHandler<HostEvent> for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.request_exit(event_loop);
            return;
        }

        let waker = self.waker();
        let (coordinator, entry) = (&mut self.coordinator, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        let (created, size) = entry.with_gpu(|gpu| {
            let mut ctx = GpuSurfaceContext::new(gpu, Some(waker));
            (coordinator.on_surface_created(&mut ctx), gpu.size())
        });
        if created.is_ok() {
            coordinator.on_surface_changed(size.width, size.height);
        }
        entry.with_window(|w| w.request_redraw());

        self.check(event_loop, created);
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::debug!("suspended");
        self.pause();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: HostEvent) {
        match event {
            HostEvent::BindFrameSource(feed) => {
                log::debug!("binding frame source {}", feed.texture());
                self.app.on_frame_source(feed);
            }
            HostEvent::FrameAvailable => {
                if let Some(entry) = &self.entry {
                    entry.with_window(|w| w.request_redraw());
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        // Redraws are driven by published frames.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if self.app.on_key(code, &mut self.coordinator) == AppControl::Exit {
                    self.request_exit(event_loop);
                    return;
                }
                // Settings changes become visible on the next frame.
                if let Some(entry) = &self.entry {
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.draw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::debug!("event loop exiting");
        self.pause();
    }
}

impl<A: HostApp> AppState<A> {
    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        entry.with_gpu_mut(|gpu| gpu.resize(new_size));
        self.coordinator
            .on_surface_changed(new_size.width, new_size.height);
        entry.with_window(|w| w.request_redraw());
    }
}
