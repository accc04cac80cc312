use anyhow::Result;
use camrec_core::{ProgramKind, SurfaceContext, TextureHandle};

use crate::device::{GpuContext, SharedGpuContext};
use crate::render::WgpuBlitPipeline;
use crate::stream::{FrameWaker, StreamTexture};

/// The GPU context current during a surface-created callback.
pub struct GpuSurfaceContext<'a, 'w> {
    gpu: &'a GpuContext<'w>,
    waker: Option<FrameWaker>,
}

impl<'a, 'w> GpuSurfaceContext<'a, 'w> {
    /// `waker` runs on the capture thread whenever a frame is published.
    pub fn new(gpu: &'a GpuContext<'w>, waker: Option<FrameWaker>) -> Self {
        Self { gpu, waker }
    }
}

impl SurfaceContext for GpuSurfaceContext<'_, '_> {
    type Shared = SharedGpuContext;
    type Pipeline = WgpuBlitPipeline;
    type Source = StreamTexture;

    fn shared_context(&self) -> SharedGpuContext {
        self.gpu.share()
    }

    fn create_pipeline(&mut self, kind: ProgramKind) -> Result<WgpuBlitPipeline> {
        Ok(WgpuBlitPipeline::new(
            self.gpu.device().clone(),
            self.gpu.queue().clone(),
            self.gpu.textures().clone(),
            self.gpu.surface_format(),
            kind,
        ))
    }

    fn create_frame_source(
        &mut self,
        _pipeline: &mut WgpuBlitPipeline,
        texture: TextureHandle,
    ) -> Result<StreamTexture> {
        Ok(StreamTexture::new(
            self.gpu.device().clone(),
            self.gpu.queue().clone(),
            self.gpu.textures().clone(),
            texture,
            self.waker.clone(),
        ))
    }
}
