use anyhow::{Result, ensure};
use camrec_core::{BlitPipeline, OverlayRect, ProgramKind, TextureHandle, Transform};
use wgpu::util::DeviceExt;

use crate::device::TextureRegistry;
use crate::render::RenderTarget;

use super::common::{
    BlitUniform, QUAD_INDICES, QUAD_VERTICES, QuadVertex, clamp_scissor, constant_fill_blend,
    texel_size,
};

fn fragment_entry(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Passthrough => "fs_passthrough",
        ProgramKind::Monochrome => "fs_monochrome",
    }
}

struct CachedBindGroup {
    texture: TextureHandle,
    generation: u64,
    bind_group: wgpu::BindGroup,
}

/// Draws a streamed texture (and overlay fills) to the surface.
///
/// Calls through [`BlitPipeline`] only record work. [`encode`](Self::encode)
/// turns it into one render pass on the frame's target: a clear, the textured
/// quad, then each fill under its scissor rect. A second `draw` in the same
/// frame replaces the first.
pub struct WgpuBlitPipeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: TextureRegistry,
    surface_format: wgpu::TextureFormat,

    kind: ProgramKind,
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    blit_layout: wgpu::PipelineLayout,
    blit: wgpu::RenderPipeline,
    fill: wgpu::RenderPipeline,

    sampler: wgpu::Sampler,
    uniform: wgpu::Buffer,
    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,
    bind_group: Option<CachedBindGroup>,

    texel_size: [f32; 2],
    pending_draw: Option<(TextureHandle, Transform)>,
    pending_fills: Vec<(OverlayRect, [f32; 4])>,
    released: bool,
}

impl WgpuBlitPipeline {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        textures: TextureRegistry,
        surface_format: wgpu::TextureFormat,
        kind: ProgramKind,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("camrec blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camrec blit bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<BlitUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let blit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("camrec blit pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let fill_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("camrec fill pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let blit = create_pipeline(
            &device,
            &shader,
            &blit_layout,
            surface_format,
            ("vs_main", fragment_entry(kind)),
            None,
        );
        let fill = create_pipeline(
            &device,
            &shader,
            &fill_layout,
            surface_format,
            ("vs_fill", "fs_fill"),
            Some(constant_fill_blend()),
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("camrec blit sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camrec blit ubo"),
            size: std::mem::size_of::<BlitUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camrec quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camrec quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!("blit pipeline created ({kind:?}, {surface_format:?})");

        Self {
            device,
            queue,
            textures,
            surface_format,
            kind,
            shader,
            bind_group_layout,
            blit_layout,
            blit,
            fill,
            sampler,
            uniform,
            quad_vbo,
            quad_ibo,
            bind_group: None,
            texel_size: [0.0; 2],
            pending_draw: None,
            pending_fills: Vec::new(),
            released: false,
        }
    }

    /// Encodes the work recorded since the last call into `target`.
    ///
    /// Always clears the target, even when nothing was recorded.
    pub fn encode(&mut self, target: &mut RenderTarget<'_>) {
        let draw = self.pending_draw.take();
        let fills = std::mem::take(&mut self.pending_fills);

        let bind_group = draw.and_then(|(texture, transform)| {
            let bind_group = self.bind_group_for(texture)?;
            let u = BlitUniform::new(&transform, self.texel_size);
            self.queue.write_buffer(&self.uniform, 0, bytemuck::bytes_of(&u));
            Some(bind_group)
        });

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("camrec blit pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        if let Some(bind_group) = &bind_group {
            rpass.set_pipeline(&self.blit);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw_indexed(0..6, 0, 0..1);
        }

        if fills.is_empty() {
            return;
        }
        rpass.set_pipeline(&self.fill);
        for (rect, [r, g, b, a]) in fills {
            let Some((x, y, w, h)) = clamp_scissor(rect, target.size) else {
                continue;
            };
            rpass.set_scissor_rect(x, y, w, h);
            rpass.set_blend_constant(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            });
            rpass.draw_indexed(0..6, 0, 0..1);
        }
    }

    /// Bind group sampling `texture`, rebuilt when the texture was reallocated.
    fn bind_group_for(&mut self, texture: TextureHandle) -> Option<wgpu::BindGroup> {
        let Some(entry) = self.textures.get(texture) else {
            log::trace!("{texture} not registered; draw skipped");
            return None;
        };

        if let Some(cached) = &self.bind_group {
            if cached.texture == texture && cached.generation == entry.generation {
                return Some(cached.bind_group.clone());
            }
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camrec blit bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&entry.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.bind_group = Some(CachedBindGroup {
            texture,
            generation: entry.generation,
            bind_group: bind_group.clone(),
        });
        Some(bind_group)
    }
}

impl BlitPipeline for WgpuBlitPipeline {
    fn create_texture_handle(&mut self) -> Result<TextureHandle> {
        ensure!(!self.released, "blit pipeline was released");
        // Placeholder size; the stream texture reallocates on its first frame.
        Ok(self.textures.allocate(&self.device, 1, 1))
    }

    fn delete_texture_handle(&mut self, texture: TextureHandle) {
        if self.textures.remove(texture) {
            log::debug!("deleted {texture}");
        }
        if self.bind_group.as_ref().is_some_and(|c| c.texture == texture) {
            self.bind_group = None;
        }
    }

    fn set_resize_hint(&mut self, width: u32, height: u32) {
        log::debug!("resize hint {width}x{height}");
        self.texel_size = texel_size(width, height);
    }

    fn draw(&mut self, texture: TextureHandle, transform: &Transform) -> Result<()> {
        ensure!(!self.released, "blit pipeline was released");
        self.pending_draw = Some((texture, *transform));
        Ok(())
    }

    fn fill_rect(&mut self, rect: OverlayRect, color: [f32; 4]) -> Result<()> {
        ensure!(!self.released, "blit pipeline was released");
        self.pending_fills.push((rect, color));
        Ok(())
    }

    fn current_program_kind(&self) -> ProgramKind {
        self.kind
    }

    fn change_program(&mut self, kind: ProgramKind) -> Result<()> {
        ensure!(!self.released, "blit pipeline was released");
        self.blit = create_pipeline(
            &self.device,
            &self.shader,
            &self.blit_layout,
            self.surface_format,
            ("vs_main", fragment_entry(kind)),
            None,
        );
        self.kind = kind;
        self.texel_size = [0.0; 2];
        log::debug!("blit program changed to {kind:?}");
        Ok(())
    }

    fn release(&mut self, keep_shared_state: bool) {
        if self.released {
            return;
        }
        self.released = true;
        self.bind_group = None;
        self.pending_draw = None;
        self.pending_fills.clear();
        if keep_shared_state {
            // Context survives; free buffers now.
            self.uniform.destroy();
            self.quad_vbo.destroy();
            self.quad_ibo.destroy();
        }
        log::debug!("blit pipeline released");
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    (vs, fs): (&str, &str),
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let label = format!("camrec {fs} pipeline");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
