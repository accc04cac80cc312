use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use camrec_core::TextureHandle;
use parking_lot::RwLock;

/// Format of every streamed camera texture. Camera bytes are sRGB encoded.
pub const STREAM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A texture registered under a [`TextureHandle`].
#[derive(Debug, Clone)]
pub struct RegisteredTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    /// Bumped on every (re)allocation; bind groups built from an older
    /// generation are stale.
    pub generation: u64,
}

#[derive(Default)]
struct Entries {
    next_handle: u32,
    generation: u64,
    map: HashMap<TextureHandle, RegisteredTexture>,
}

/// Handle → texture table shared by every user of one GPU context.
#[derive(Clone, Default)]
pub struct TextureRegistry {
    inner: Arc<RwLock<Entries>>,
}

impl TextureRegistry {
    /// Allocates a texture and returns its new handle.
    pub fn allocate(&self, device: &wgpu::Device, width: u32, height: u32) -> TextureHandle {
        let mut entries = self.inner.write();
        entries.next_handle += 1;
        let handle = TextureHandle(entries.next_handle);
        entries.generation += 1;
        let generation = entries.generation;
        entries
            .map
            .insert(handle, create_texture(device, handle, width, height, generation));
        log::debug!("allocated {handle} {width}x{height}");
        handle
    }

    /// Replaces the texture behind `handle` with one of a new size.
    pub fn reallocate(
        &self,
        device: &wgpu::Device,
        handle: TextureHandle,
        width: u32,
        height: u32,
    ) -> Result<RegisteredTexture> {
        let mut entries = self.inner.write();
        if !entries.map.contains_key(&handle) {
            return Err(anyhow!("{handle} is not registered"));
        }
        entries.generation += 1;
        let texture = create_texture(device, handle, width, height, entries.generation);
        entries.map.insert(handle, texture.clone());
        log::debug!("reallocated {handle} {width}x{height}");
        Ok(texture)
    }

    pub fn get(&self, handle: TextureHandle) -> Option<RegisteredTexture> {
        self.inner.read().map.get(&handle).cloned()
    }

    pub fn remove(&self, handle: TextureHandle) -> bool {
        self.inner.write().map.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn create_texture(
    device: &wgpu::Device,
    handle: TextureHandle,
    width: u32,
    height: u32,
    generation: u64,
) -> RegisteredTexture {
    let width = width.max(1);
    let height = height.max(1);
    let label = format!("camrec stream {handle}");
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: STREAM_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    RegisteredTexture {
        texture,
        view,
        width,
        height,
        generation,
    }
}
