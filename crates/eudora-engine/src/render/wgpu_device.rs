use std::borrow::Cow;
use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::backend::check_index_range;
use crate::error::{EngineError, Result};
use crate::render::{
    BlendMode, BufferHandle, DrawCall, GpuDevice, ShaderHandle, ShaderSource, ShaderStage,
    TextureDesc, TextureFormat, TextureHandle, Uniform, VertexFormat, VertexLayout,
};

// ── resources ─────────────────────────────────────────────────────────────

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuGeometry {
    label: String,
    vertices: Option<wgpu::Buffer>,
    indices: Option<wgpu::Buffer>,
    index_count: usize,
    layout: Option<VertexLayout>,
}

/// A draw waiting for `flush`, holding the buffers it was issued against.
/// wgpu buffers are reference counted, so a re-upload into the same slot
/// leaves these alive and unchanged.
struct QueuedDraw {
    call: DrawCall,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    layout: VertexLayout,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    shader: ShaderHandle,
    layout: VertexLayout,
    blend: BlendMode,
    textures: usize,
}

struct CachedPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

struct PreparedDraw {
    key: PipelineKey,
    bind_group: wgpu::BindGroup,
    vertices: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    indices: std::ops::Range<u32>,
}

/// [`GpuDevice`] backed by wgpu.
///
/// Resource calls execute immediately. Draw calls are queued with the geometry
/// buffers current at `draw` time and encoded into the frame by
/// [`WgpuDevice::flush`].
///
/// Bind group 0 layout: binding 0 is the uniform block packed from the call's uniforms
/// in order; each texture unit `n` binds its view at `1 + 2n` and a linear sampler at
/// `2 + 2n`.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    sampler: wgpu::Sampler,

    textures: Vec<GpuTexture>,
    buffers: Vec<GpuGeometry>,
    shaders: Vec<wgpu::ShaderModule>,
    pipelines: HashMap<PipelineKey, CachedPipeline>,

    pending: Vec<QueuedDraw>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, target_format: wgpu::TextureFormat) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("eudora linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            target_format,
            sampler,
            textures: Vec::new(),
            buffers: Vec::new(),
            shaders: Vec::new(),
            pipelines: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Number of draws waiting for [`flush`](Self::flush).
    pub fn pending_draws(&self) -> usize {
        self.pending.len()
    }

    /// Encodes every queued draw into one render pass over `view`, loading its
    /// existing contents.
    pub fn flush(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        if self.pending.is_empty() {
            return;
        }

        let queued = std::mem::take(&mut self.pending);
        let mut prepared = Vec::with_capacity(queued.len());
        for draw in queued {
            match self.prepare(draw) {
                Ok(p) => prepared.push(p),
                Err(e) => log::warn!("dropping draw call: {e}"),
            }
        }

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("eudora draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in &prepared {
            let Some(cached) = self.pipelines.get(&draw.key) else { continue; };

            rpass.set_pipeline(&cached.pipeline);
            rpass.set_bind_group(0, &draw.bind_group, &[]);
            rpass.set_vertex_buffer(0, draw.vertices.slice(..));
            rpass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(draw.indices.clone(), 0, 0..1);
        }
    }

    fn prepare(&mut self, draw: QueuedDraw) -> Result<PreparedDraw> {
        let QueuedDraw {
            call,
            vertices,
            indices: index_buffer,
            layout,
        } = draw;

        let key = PipelineKey {
            shader: call.shader,
            layout,
            blend: call.blend,
            textures: call.textures.len(),
        };
        self.ensure_pipeline(&key)?;

        let uniform_bytes = pack_uniforms(&call.uniforms);
        let ubo = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("eudora uniform block"),
                contents: &uniform_bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let mut views = Vec::with_capacity(call.textures.len());
        let mut sorted = call.textures.clone();
        sorted.sort_by_key(|(unit, _)| *unit);
        for (_, tex) in &sorted {
            let t = self
                .textures
                .get(tex.0 as usize)
                .ok_or(EngineError::UnknownResource("texture"))?;
            views.push(&t.view);
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: ubo.as_entire_binding(),
        }];
        for (n, view) in views.iter().enumerate() {
            let n = n as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * n,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * n,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            });
        }

        let cached = self
            .pipelines
            .get(&key)
            .ok_or(EngineError::UnknownResource("pipeline"))?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("eudora draw bind group"),
            layout: &cached.bind_group_layout,
            entries: &entries,
        });

        Ok(PreparedDraw {
            key,
            bind_group,
            vertices,
            index_buffer,
            indices: call.indices,
        })
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) -> Result<()> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }
        let module = self
            .shaders
            .get(key.shader.0 as usize)
            .ok_or(EngineError::UnknownResource("shader"))?;

        let mut bgl_entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        for n in 0..key.textures as u32 {
            bgl_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + 2 * n,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            bgl_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + 2 * n,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("eudora draw bgl"),
                entries: &bgl_entries,
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("eudora pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let attributes: Vec<wgpu::VertexAttribute> = key
            .layout
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format(a.format),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("eudora pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: key.layout.stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: blend_state(key.blend),
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
            });

        self.pipelines.insert(
            key.clone(),
            CachedPipeline {
                pipeline,
                bind_group_layout,
            },
        );
        Ok(())
    }
}

impl GpuDevice for WgpuDevice {
    fn create_texture(&mut self, label: &str, desc: TextureDesc, pixels: &[u8]) -> Result<TextureHandle> {
        if pixels.len() != desc.byte_len() {
            return Err(EngineError::InvalidTextureData {
                label: label.to_string(),
                expected: desc.byte_len(),
                actual: pixels.len(),
            });
        }

        let format = match desc.format {
            TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        };
        let size = wgpu::Extent3d {
            width: desc.width.max(1),
            height: desc.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if !pixels.is_empty() {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(desc.width * desc.format.bytes_per_pixel()),
                    rows_per_image: Some(desc.height),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            _texture: texture,
            view,
        });
        Ok(handle)
    }

    fn create_buffer(&mut self, label: &str) -> Result<BufferHandle> {
        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(GpuGeometry {
            label: label.to_string(),
            vertices: None,
            indices: None,
            index_count: 0,
            layout: None,
        });
        Ok(handle)
    }

    fn upload_geometry(
        &mut self,
        buffer: BufferHandle,
        vertices: &[u8],
        indices: &[u32],
        layout: &VertexLayout,
    ) -> Result<()> {
        let device = &self.device;
        let slot = self
            .buffers
            .get_mut(buffer.0 as usize)
            .ok_or(EngineError::UnknownResource("buffer"))?;

        slot.vertices = (!vertices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(slot.label.as_str()),
                contents: vertices,
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        slot.indices = (!indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(slot.label.as_str()),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        slot.index_count = indices.len();
        slot.layout = Some(layout.clone());
        Ok(())
    }

    fn compile_shader(&mut self, label: &str, sources: &[ShaderSource]) -> Result<ShaderHandle> {
        let wgsl = sources
            .iter()
            .find(|s| s.stage == ShaderStage::Wgsl)
            .ok_or_else(|| EngineError::ShaderCompile {
                message: format!("{label}: the wgpu backend needs a WGSL module"),
            })?;

        for entry in ["vs_main", "fs_main"] {
            if !wgsl.source.contains(entry) {
                return Err(EngineError::ShaderCompile {
                    message: format!("{label}: missing entry point `{entry}`"),
                });
            }
        }

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Owned(wgsl.source.clone())),
            });

        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shaders.push(module);
        Ok(handle)
    }

    fn draw(&mut self, call: &DrawCall) -> Result<()> {
        let geom = self
            .buffers
            .get(call.buffer.0 as usize)
            .ok_or(EngineError::UnknownResource("buffer"))?;
        if call.shader.0 as usize >= self.shaders.len() {
            return Err(EngineError::UnknownResource("shader"));
        }
        check_index_range(&call.indices, geom.index_count)?;
        if call.indices.is_empty() {
            return Ok(());
        }

        let (Some(vertices), Some(indices), Some(layout)) =
            (geom.vertices.clone(), geom.indices.clone(), geom.layout.clone())
        else {
            return Err(EngineError::UnknownResource("geometry"));
        };
        self.pending.push(QueuedDraw {
            call: call.clone(),
            vertices,
            indices,
            layout,
        });
        Ok(())
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

fn vertex_format(f: VertexFormat) -> wgpu::VertexFormat {
    match f {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Opaque => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
    }
}

/// Packs uniforms with WGSL uniform-buffer alignment (scalars 4, vectors and
/// matrices 16), padding the block to 16 bytes. An empty list yields one zeroed row.
pub(crate) fn pack_uniforms(uniforms: &[(&'static str, Uniform)]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();

    for (_, value) in uniforms {
        let (align, bytes): (usize, Vec<u8>) = match value {
            Uniform::Float(v) => (4, bytemuck::bytes_of(v).to_vec()),
            Uniform::Int(v) => (4, bytemuck::bytes_of(v).to_vec()),
            Uniform::Vec3(v) => (16, bytemuck::cast_slice(v).to_vec()),
            Uniform::Vec4(v) => (16, bytemuck::cast_slice(v).to_vec()),
            Uniform::Mat4(m) => (16, bytemuck::cast_slice(&m.to_cols_array()).to_vec()),
        };
        let padded = out.len().next_multiple_of(align);
        out.resize(padded, 0);
        out.extend_from_slice(&bytes);
    }

    let total = out.len().next_multiple_of(16).max(16);
    out.resize(total, 0);
    out
}
