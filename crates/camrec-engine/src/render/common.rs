//! Shared GPU types for the blit pipeline.

use bytemuck::{Pod, Zeroable};
use camrec_core::{OverlayRect, Transform};

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub corner: [f32; 2], // 0..1, top-left origin
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { corner: [0.0, 0.0] },
    QuadVertex { corner: [1.0, 0.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── blit uniform ──────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct BlitUniform {
    pub transform: [f32; 16],
    pub texel_size: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl BlitUniform {
    pub(super) fn new(transform: &Transform, texel_size: [f32; 2]) -> Self {
        Self {
            transform: *transform.as_array(),
            texel_size,
            _pad: [0.0; 2],
        }
    }
}

/// `1 / size` per axis; zero for a zero dimension.
pub(super) fn texel_size(width: u32, height: u32) -> [f32; 2] {
    let inv = |v: u32| if v == 0 { 0.0 } else { 1.0 / v as f32 };
    [inv(width), inv(height)]
}

// ── blend ─────────────────────────────────────────────────────────────────

/// Replaces the destination with the pass's blend constant.
pub(super) fn constant_fill_blend() -> wgpu::BlendState {
    let replace = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Constant,
        dst_factor: wgpu::BlendFactor::Zero,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: replace,
        alpha: replace,
    }
}

// ── scissor rect ──────────────────────────────────────────────────────────

/// Clamps `rect` to a `(width, height)` target.
///
/// Returns `None` when nothing of the rect is visible.
pub(super) fn clamp_scissor(rect: OverlayRect, target: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let (tw, th) = target;
    if rect.x >= tw || rect.y >= th {
        return None;
    }
    let w = rect.width.min(tw - rect.x);
    let h = rect.height.min(th - rect.y);
    if w == 0 || h == 0 {
        return None;
    }
    Some((rect.x, rect.y, w, h))
}
