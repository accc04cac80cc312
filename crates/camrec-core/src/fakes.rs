//! In-memory collaborators that append every call to a shared log.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use parking_lot::Mutex;

use crate::collab::{
    BlitPipeline, Encoder, FrameSource, FrameStamp, HostChannel, OverlayRect, ProgramKind,
    SurfaceContext, TextureHandle, Transform,
};
use crate::target::RecordingTarget;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    // frame source
    Latch,
    ReleaseSource,
    // pipeline
    CreatePipeline(u32),
    CreateTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    ResizeHint(u32, u32),
    Draw(TextureHandle),
    Fill(OverlayRect),
    ChangeProgram(ProgramKind),
    ReleasePipeline(bool),
    // encoder
    Start { width: u32, height: u32, frame_rate: u32, bitrate: u32, context: u32 },
    Stop,
    Rebind(u32),
    SetTexture(TextureHandle),
    FrameAvailable(u64),
    // host
    Bind(TextureHandle),
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.lock())
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().iter().filter(|c| pred(c)).count()
    }
}

// ── frame source ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeFeed(pub TextureHandle);

pub struct FakeSource {
    log: CallLog,
    texture: TextureHandle,
    sequence: u64,
}

impl FrameSource for FakeSource {
    type Feed = FakeFeed;

    fn latch_newest(&mut self) -> Result<()> {
        self.sequence += 1;
        self.log.push(Call::Latch);
        Ok(())
    }

    fn current_transform(&self) -> Transform {
        Transform::FLIP_Y
    }

    fn stamp(&self) -> FrameStamp {
        FrameStamp {
            sequence: self.sequence,
            timestamp_ns: self.sequence * 33_333_333,
            transform: Transform::FLIP_Y,
        }
    }

    fn feed(&self) -> FakeFeed {
        FakeFeed(self.texture)
    }

    fn release(&mut self) {
        self.log.push(Call::ReleaseSource);
    }
}

// ── pipeline ──────────────────────────────────────────────────────────────

pub struct FakePipeline {
    log: CallLog,
    next_texture: u32,
    kind: ProgramKind,
}

impl BlitPipeline for FakePipeline {
    fn create_texture_handle(&mut self) -> Result<TextureHandle> {
        let tex = TextureHandle(self.next_texture);
        self.next_texture += 1;
        self.log.push(Call::CreateTexture(tex));
        Ok(tex)
    }

    fn delete_texture_handle(&mut self, texture: TextureHandle) {
        self.log.push(Call::DeleteTexture(texture));
    }

    fn set_resize_hint(&mut self, width: u32, height: u32) {
        self.log.push(Call::ResizeHint(width, height));
    }

    fn draw(&mut self, texture: TextureHandle, transform: &Transform) -> Result<()> {
        assert_eq!(*transform, Transform::FLIP_Y, "draw must use the source transform");
        self.log.push(Call::Draw(texture));
        Ok(())
    }

    fn fill_rect(&mut self, rect: OverlayRect, _color: [f32; 4]) -> Result<()> {
        self.log.push(Call::Fill(rect));
        Ok(())
    }

    fn current_program_kind(&self) -> ProgramKind {
        self.kind
    }

    fn change_program(&mut self, kind: ProgramKind) -> Result<()> {
        self.kind = kind;
        self.log.push(Call::ChangeProgram(kind));
        Ok(())
    }

    fn release(&mut self, keep_shared_state: bool) {
        self.log.push(Call::ReleasePipeline(keep_shared_state));
    }
}

// ── encoder ───────────────────────────────────────────────────────────────

pub struct FakeEncoder {
    log: CallLog,
    pub recording: Arc<AtomicBool>,
    pub fail_start: bool,
}

impl FakeEncoder {
    pub fn new(log: CallLog) -> Self {
        Self { log, recording: Arc::default(), fail_start: false }
    }
}

impl Encoder for FakeEncoder {
    type Context = u32;

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    fn start_recording(&mut self, target: RecordingTarget<u32>) -> Result<()> {
        if self.fail_start {
            bail!("encoder rejected configuration");
        }
        self.recording.store(true, Ordering::Release);
        self.log.push(Call::Start {
            width: target.width(),
            height: target.height(),
            frame_rate: target.frame_rate(),
            bitrate: target.bitrate(),
            context: *target.shared_context(),
        });
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<()> {
        self.recording.store(false, Ordering::Release);
        self.log.push(Call::Stop);
        Ok(())
    }

    fn rebind_gpu_context(&mut self, context: u32) -> Result<()> {
        self.log.push(Call::Rebind(context));
        Ok(())
    }

    fn set_texture_handle(&mut self, texture: TextureHandle) -> Result<()> {
        self.log.push(Call::SetTexture(texture));
        Ok(())
    }

    fn notify_frame_available(&mut self, frame: FrameStamp) -> Result<()> {
        self.log.push(Call::FrameAvailable(frame.sequence));
        Ok(())
    }
}

// ── host + surface ────────────────────────────────────────────────────────

pub struct FakeHost {
    log: CallLog,
}

impl FakeHost {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl HostChannel<FakeFeed> for FakeHost {
    fn bind_frame_source(&self, feed: FakeFeed) -> Result<()> {
        self.log.push(Call::Bind(feed.0));
        Ok(())
    }
}

/// A GPU context identified by `id`; each re-creation should use a new id.
pub struct FakeSurface {
    pub id: u32,
    pub log: CallLog,
    pub fail_pipeline: bool,
    pub fail_source: bool,
}

impl FakeSurface {
    pub fn new(id: u32, log: &CallLog) -> Self {
        Self { id, log: log.clone(), fail_pipeline: false, fail_source: false }
    }
}

impl SurfaceContext for FakeSurface {
    type Shared = u32;
    type Pipeline = FakePipeline;
    type Source = FakeSource;

    fn shared_context(&self) -> u32 {
        self.id
    }

    fn create_pipeline(&mut self, kind: ProgramKind) -> Result<FakePipeline> {
        if self.fail_pipeline {
            bail!("shader compilation failed");
        }
        self.log.push(Call::CreatePipeline(self.id));
        Ok(FakePipeline {
            log: self.log.clone(),
            next_texture: self.id * 10 + 1,
            kind,
        })
    }

    fn create_frame_source(
        &mut self,
        _pipeline: &mut FakePipeline,
        texture: TextureHandle,
    ) -> Result<FakeSource> {
        if self.fail_source {
            bail!("surface texture unavailable");
        }
        Ok(FakeSource { log: self.log.clone(), texture, sequence: 0 })
    }
}
