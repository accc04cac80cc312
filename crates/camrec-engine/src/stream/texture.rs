use std::sync::Arc;

use anyhow::{Context, Result};
use camrec_core::{FrameSource, FrameStamp, TextureHandle, Transform};

use super::feed::{CameraFrame, FrameFeed, FrameSlot, FrameWaker};
use crate::device::TextureRegistry;

/// Camera-fed texture latched on the render thread.
///
/// Frames published through the [`FrameFeed`] are uploaded into the registered
/// texture by [`FrameSource::latch_newest`]. The texture is reallocated when
/// the incoming frame size changes.
pub struct StreamTexture {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: TextureRegistry,
    texture: TextureHandle,
    slot: Arc<FrameSlot>,
    waker: Option<FrameWaker>,
    stamp: FrameStamp,
}

impl StreamTexture {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        textures: TextureRegistry,
        texture: TextureHandle,
        waker: Option<FrameWaker>,
    ) -> Self {
        Self {
            device,
            queue,
            textures,
            texture,
            slot: Arc::new(FrameSlot::default()),
            waker,
            stamp: FrameStamp::default(),
        }
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    fn upload(&self, frame: &CameraFrame) -> Result<()> {
        let current = self
            .textures
            .get(self.texture)
            .with_context(|| format!("{} was released", self.texture))?;

        let target = if (current.width, current.height) == (frame.width, frame.height) {
            current
        } else {
            log::debug!(
                "{} resized {}x{} -> {}x{}",
                self.texture,
                current.width,
                current.height,
                frame.width,
                frame.height
            );
            self.textures
                .reallocate(&self.device, self.texture, frame.width, frame.height)?
        };

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }
}

impl FrameSource for StreamTexture {
    type Feed = FrameFeed;

    fn latch_newest(&mut self) -> Result<()> {
        let Some((sequence, frame)) = self.slot.take_latest() else {
            return Ok(());
        };
        self.upload(&frame)?;
        self.stamp = FrameStamp {
            sequence,
            timestamp_ns: frame.timestamp_ns,
            transform: frame.transform,
        };
        Ok(())
    }

    fn current_transform(&self) -> Transform {
        self.stamp.transform
    }

    fn stamp(&self) -> FrameStamp {
        self.stamp
    }

    fn feed(&self) -> FrameFeed {
        FrameFeed::new(Arc::clone(&self.slot), self.texture, self.waker.clone())
    }

    fn release(&mut self) {
        self.slot.close();
        if self.textures.remove(self.texture) {
            log::debug!("released {}", self.texture);
        }
    }
}
