use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::registry::TextureRegistry;

/// Identity of one GPU context lifetime. Never reused within a process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Sibling handle to a [`GpuContext`](super::GpuContext) for the encoder thread.
///
/// Shares the device, queue and texture registry, so texture handles resolve to
/// the same GPU images the preview draws.
#[derive(Clone)]
pub struct SharedGpuContext {
    id: ContextId,
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: TextureRegistry,
}

impl SharedGpuContext {
    pub(crate) fn new(
        id: ContextId,
        device: wgpu::Device,
        queue: wgpu::Queue,
        textures: TextureRegistry,
    ) -> Self {
        Self { id, device, queue, textures }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }
}

impl fmt::Debug for SharedGpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedGpuContext")
            .field("id", &self.id)
            .field("textures", &self.textures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_ids_are_unique_and_increasing() {
        let a = ContextId::next();
        let b = ContextId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn context_id_display() {
        assert_eq!(ContextId(3).to_string(), "ctx#3");
    }
}
