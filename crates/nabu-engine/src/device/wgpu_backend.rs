use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;

use winit::dpi::PhysicalSize;

use crate::assets::ImageData;
use crate::gpu::{
    AttributeFormat, BackendError, BufferKind, FrameStatus, GraphicsBackend, Handle, Primitive,
    ProgramSource, ResourceKind, ShaderStage, UniformLocation, VertexLayoutDesc,
};
use crate::math::ClipDepth;
use crate::shader::{ShaderError, UniformValue};

use super::surface::SurfaceErrorAction;
use super::uniform_layout::{UniformLayout, align_to};
use super::{Gpu, GpuFrame};

/// Vertex stage entry point every WGSL program must export.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage entry point every WGSL program must export.
pub const FRAGMENT_ENTRY: &str = "fs_main";

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const MIN_ARENA_BYTES: u64 = 4096;

struct BufferObject {
    kind: BufferKind,
    buffer: Option<wgpu::Buffer>,
    len: u64,
}

struct TextureObject {
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct ProgramObject {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    uniforms: UniformLayout,
    /// CPU copy of the uniform struct; snapshotted into the frame arena per draw.
    staging: Vec<u8>,
}

enum Object {
    Buffer(BufferObject),
    VertexLayout(VertexLayoutDesc),
    Texture(TextureObject),
    Program(ProgramObject),
}

impl Object {
    fn kind(&self) -> ResourceKind {
        match self {
            Object::Buffer(_) => ResourceKind::Buffer,
            Object::VertexLayout(_) => ResourceKind::VertexLayout,
            Object::Texture(_) => ResourceKind::Texture,
            Object::Program(_) => ResourceKind::ShaderProgram,
        }
    }
}

#[derive(Debug, Default, Copy, Clone)]
struct Bindings {
    program: Option<Handle>,
    layout: Option<Handle>,
    vertex_buffer: Option<Handle>,
    index_buffer: Option<Handle>,
    texture: Option<Handle>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    program: Handle,
    layout: Handle,
    primitive: Primitive,
}

/// A draw recorded between `begin_frame` and `present`, replayed in one pass.
struct PendingDraw {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    indices: Option<wgpu::Buffer>,
    texture: wgpu::BindGroup,
    uniform_offset: u32,
    uniform_size: u32,
    range: Range<u32>,
}

/// Per-frame uniform snapshots, bound with dynamic offsets.
struct UniformArena {
    bytes: Vec<u8>,
    alignment: u32,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    /// Bind groups keyed by binding size; rebuilt when the buffer grows.
    groups: HashMap<u32, wgpu::BindGroup>,
}

impl UniformArena {
    fn new(alignment: u32) -> Self {
        Self { bytes: Vec::new(), alignment: alignment.max(1), buffer: None, capacity: 0, groups: HashMap::new() }
    }

    /// Appends `data` at the next aligned offset and returns that offset.
    fn push(&mut self, data: &[u8], size: u32) -> u32 {
        let offset = align_to(self.bytes.len() as u32, self.alignment);
        self.bytes.resize(offset as usize, 0);
        self.bytes.extend_from_slice(data);
        self.bytes.resize((offset + size) as usize, 0);
        offset
    }

    fn clear(&mut self) {
        self.bytes.clear();
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.bytes.is_empty() {
            return;
        }
        let padded = align_to(self.bytes.len() as u32, self.alignment);
        self.bytes.resize(padded as usize, 0);

        let needed = u64::from(padded);
        if self.buffer.is_none() || needed > self.capacity {
            self.capacity = needed.next_power_of_two().max(MIN_ARENA_BYTES);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("nabu uniform arena"),
                size: self.capacity,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.groups.clear();
            log::debug!("uniform arena grown to {} bytes", self.capacity);
        }
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, &self.bytes);
        }
    }

    fn group(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, size: u32) -> Option<wgpu::BindGroup> {
        let buffer = self.buffer.as_ref()?;
        let group = self.groups.entry(size).or_insert_with(|| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("nabu uniform bind group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: 0,
                        size: NonZeroU64::new(u64::from(size)),
                    }),
                }],
            })
        });
        Some(group.clone())
    }
}

/// [`GraphicsBackend`] on top of wgpu.
///
/// Programs are WGSL; each stage string is compiled as its own module and must
/// export [`VERTEX_ENTRY`] / [`FRAGMENT_ENTRY`]. Layout contract:
/// - `@group(0) @binding(0)`: a uniform struct whose members follow the
///   program's `ProgramSource::uniforms` order
/// - `@group(1) @binding(0)`: `texture_2d<f32>`, `@group(1) @binding(1)`: `sampler`
///
/// Draws are recorded and replayed in a single render pass at `present`.
/// Geometry stages are not supported.
pub struct WgpuBackend {
    gpu: Gpu,
    next_handle: u32,
    objects: HashMap<Handle, Object>,
    bound: Bindings,

    uniform_bgl: wgpu::BindGroupLayout,
    texture_bgl: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    arena: UniformArena,
    draws: Vec<PendingDraw>,
    frame: Option<GpuFrame>,
}

impl WgpuBackend {
    pub fn new(gpu: Gpu) -> Self {
        let device = gpu.device();

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nabu uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nabu texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("nabu pipeline layout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nabu sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment;

        // Bound when a draw has no texture, so programs can always sample group 1.
        let white_image = ImageData::solid(1, 1, [255, 255, 255, 255]);
        let white = create_texture_object(device, &texture_bgl, &sampler, &white_image);
        write_image(gpu.queue(), &white.texture, &white_image);

        Self {
            next_handle: 1,
            objects: HashMap::new(),
            bound: Bindings::default(),
            white: white.bind_group,
            uniform_bgl,
            texture_bgl,
            pipeline_layout,
            sampler,
            pipelines: HashMap::new(),
            arena: UniformArena::new(alignment),
            draws: Vec::new(),
            frame: None,
            gpu,
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn issue(&mut self, object: Object) -> Result<Handle, BackendError> {
        let handle = Handle::new(self.next_handle)
            .ok_or_else(|| BackendError::Device("handle space exhausted".to_owned()))?;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.objects.insert(handle, object);
        Ok(handle)
    }

    fn lookup(&self, kind: ResourceKind, handle: Handle) -> Result<&Object, BackendError> {
        self.objects
            .get(&handle)
            .filter(|o| o.kind() == kind)
            .ok_or(BackendError::UnknownHandle { kind, handle })
    }

    fn lookup_mut(&mut self, kind: ResourceKind, handle: Handle) -> Result<&mut Object, BackendError> {
        self.objects
            .get_mut(&handle)
            .filter(|o| o.kind() == kind)
            .ok_or(BackendError::UnknownHandle { kind, handle })
    }

    fn program(&self, handle: Handle) -> Result<&ProgramObject, BackendError> {
        match self.lookup(ResourceKind::ShaderProgram, handle)? {
            Object::Program(p) => Ok(p),
            _ => Err(BackendError::UnknownHandle { kind: ResourceKind::ShaderProgram, handle }),
        }
    }

    fn buffer(&self, handle: Handle) -> Result<&BufferObject, BackendError> {
        match self.lookup(ResourceKind::Buffer, handle)? {
            Object::Buffer(b) => Ok(b),
            _ => Err(BackendError::UnknownHandle { kind: ResourceKind::Buffer, handle }),
        }
    }

    fn compile(&self, stage: ShaderStage, label: &str, text: &str) -> Result<wgpu::ShaderModule, ShaderError> {
        compile_wgsl(self.gpu.device(), stage, label, text)
    }

    fn pipeline(&mut self, key: PipelineKey) -> Result<wgpu::RenderPipeline, BackendError> {
        if let Some(p) = self.pipelines.get(&key) {
            return Ok(p.clone());
        }

        let program = self.program(key.program)?;
        let desc = match self.lookup(ResourceKind::VertexLayout, key.layout)? {
            Object::VertexLayout(d) => d,
            _ => return Err(BackendError::UnknownHandle { kind: ResourceKind::VertexLayout, handle: key.layout }),
        };
        let attributes: Vec<wgpu::VertexAttribute> = desc
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format(a.format),
                offset: u64::from(a.offset),
                shader_location: a.location,
            })
            .collect();
        let (topology, strip_index_format) = topology(key.primitive);

        let device = self.gpu.device();
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("nabu pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(desc.stride),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.gpu.depth_format(),
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(BackendError::Device(format!("pipeline for program {}: {err}", key.program)));
        }

        log::debug!("built pipeline {:?}", key);
        self.pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    fn record_draw(&mut self, primitive: Primitive, indices: Option<Handle>, range: Range<u32>) -> Result<(), BackendError> {
        if self.frame.is_none() {
            return Err(BackendError::MissingBinding("drawable"));
        }
        let program = self.bound.program.ok_or(BackendError::MissingBinding("program"))?;
        let layout = self.bound.layout.ok_or(BackendError::MissingBinding("vertex layout"))?;
        let vertex_buffer = self.bound.vertex_buffer.ok_or(BackendError::MissingBinding("vertex buffer"))?;

        let pipeline = self.pipeline(PipelineKey { program, layout, primitive })?;

        let vertex_buffer = self
            .buffer(vertex_buffer)?
            .buffer
            .clone()
            .ok_or_else(|| BackendError::InvalidData("vertex buffer is empty".to_owned()))?;
        let indices = match indices {
            Some(h) => Some(
                self.buffer(h)?
                    .buffer
                    .clone()
                    .ok_or_else(|| BackendError::InvalidData("index buffer is empty".to_owned()))?,
            ),
            None => None,
        };
        let texture = match self.bound.texture {
            Some(h) => match self.lookup(ResourceKind::Texture, h)? {
                Object::Texture(t) => t.bind_group.clone(),
                _ => return Err(BackendError::UnknownHandle { kind: ResourceKind::Texture, handle: h }),
            },
            None => self.white.clone(),
        };

        let Some(Object::Program(program)) = self.objects.get(&program) else {
            return Err(BackendError::UnknownHandle { kind: ResourceKind::ShaderProgram, handle: program });
        };
        let uniform_size = program.uniforms.size();
        let uniform_offset = self.arena.push(&program.staging, uniform_size);

        self.draws.push(PendingDraw {
            pipeline,
            vertex_buffer,
            indices,
            texture,
            uniform_offset,
            uniform_size,
            range,
        });
        Ok(())
    }

    fn clear_frame(&mut self) {
        self.draws.clear();
        self.arena.clear();
    }
}

impl GraphicsBackend for WgpuBackend {
    fn clip_depth(&self) -> ClipDepth {
        ClipDepth::ZeroToOne
    }

    fn create_buffer(&mut self, kind: BufferKind, data: Option<&[u8]>) -> Result<Handle, BackendError> {
        let data = data.unwrap_or_default();
        if kind == BufferKind::Index && data.len() % 4 != 0 {
            return Err(BackendError::InvalidData(format!(
                "index data of {} bytes is not u32-aligned",
                data.len()
            )));
        }
        let buffer = create_gpu_buffer(self.gpu.device(), self.gpu.queue(), kind, data);
        self.issue(Object::Buffer(BufferObject { kind, buffer, len: data.len() as u64 }))
    }

    fn upload_buffer(&mut self, buffer: Handle, data: &[u8]) -> Result<(), BackendError> {
        let kind = self.buffer(buffer)?.kind;
        if kind == BufferKind::Index && data.len() % 4 != 0 {
            return Err(BackendError::InvalidData(format!(
                "index data of {} bytes is not u32-aligned",
                data.len()
            )));
        }
        // Buffers are reallocated rather than rewritten so draws already
        // recorded this frame keep the old contents.
        let fresh = create_gpu_buffer(self.gpu.device(), self.gpu.queue(), kind, data);
        if let Object::Buffer(b) = self.lookup_mut(ResourceKind::Buffer, buffer)? {
            b.buffer = fresh;
            b.len = data.len() as u64;
        }
        Ok(())
    }

    fn create_vertex_layout(&mut self, desc: &VertexLayoutDesc) -> Result<Handle, BackendError> {
        if let Some(attr) = desc.attributes.iter().find(|a| a.offset + a.format.size() > desc.stride) {
            return Err(BackendError::InvalidData(format!(
                "attribute {} overruns stride {}",
                attr.location, desc.stride
            )));
        }
        self.issue(Object::VertexLayout(desc.clone()))
    }

    fn create_texture(&mut self, image: Option<&ImageData>) -> Result<Handle, BackendError> {
        let placeholder;
        let image = match image {
            Some(i) => i,
            None => {
                placeholder = ImageData::solid(1, 1, [255, 255, 255, 255]);
                &placeholder
            }
        };
        let texture = create_texture_object(self.gpu.device(), &self.texture_bgl, &self.sampler, image);
        write_image(self.gpu.queue(), &texture.texture, image);
        self.issue(Object::Texture(texture))
    }

    fn upload_image(&mut self, texture: Handle, image: &ImageData) -> Result<(), BackendError> {
        let resized = match self.lookup(ResourceKind::Texture, texture)? {
            Object::Texture(t) => (t.width, t.height) != (image.width, image.height),
            _ => false,
        };
        if resized {
            let fresh = create_texture_object(self.gpu.device(), &self.texture_bgl, &self.sampler, image);
            if let Object::Texture(t) = self.lookup_mut(ResourceKind::Texture, texture)? {
                *t = fresh;
            }
        }
        if let Object::Texture(t) = self.lookup(ResourceKind::Texture, texture)? {
            write_image(self.gpu.queue(), &t.texture, image);
        }
        Ok(())
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<Handle, ShaderError> {
        if source.geometry.is_some() {
            return Err(ShaderError::Link {
                log: format!("{}: geometry stages are not supported by the wgpu backend", source.label),
            });
        }
        let vertex = self.compile(ShaderStage::Vertex, &source.label, &source.vertex)?;
        let fragment = self.compile(ShaderStage::Fragment, &source.label, &source.fragment)?;
        let uniforms = UniformLayout::new(&source.uniforms);
        let staging = vec![0; uniforms.size() as usize];
        log::debug!("program '{}' uniform block: {} bytes", source.label, uniforms.size());

        self.issue(Object::Program(ProgramObject { vertex, fragment, uniforms, staging }))
            .map_err(|e| ShaderError::Gpu(e.into()))
    }

    fn uniform_location(&mut self, program: Handle, name: &str) -> Option<UniformLocation> {
        self.program(program).ok()?.uniforms.location(name)
    }

    fn set_uniform(
        &mut self,
        program: Handle,
        location: UniformLocation,
        value: &UniformValue,
    ) -> Result<(), BackendError> {
        let Object::Program(p) = self.lookup_mut(ResourceKind::ShaderProgram, program)? else {
            return Err(BackendError::UnknownHandle { kind: ResourceKind::ShaderProgram, handle: program });
        };
        let (kind, offset) = p
            .uniforms
            .slot(location)
            .ok_or_else(|| BackendError::InvalidData(format!("no uniform at location {}", location.0)))?;
        if kind != value.kind() {
            return Err(BackendError::InvalidData(format!(
                "uniform at location {} is {kind:?}, got {:?}",
                location.0,
                value.kind()
            )));
        }
        let bytes = value.to_bytes();
        let start = offset as usize;
        p.staging[start..start + bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    fn bind(&mut self, kind: ResourceKind, handle: Handle) -> Result<(), BackendError> {
        let buffer_kind = match self.lookup(kind, handle)? {
            Object::Buffer(b) => Some(b.kind),
            _ => None,
        };
        match (kind, buffer_kind) {
            (ResourceKind::Buffer, Some(BufferKind::Index)) => self.bound.index_buffer = Some(handle),
            (ResourceKind::Buffer, _) => self.bound.vertex_buffer = Some(handle),
            (ResourceKind::VertexLayout, _) => self.bound.layout = Some(handle),
            (ResourceKind::Texture, _) => self.bound.texture = Some(handle),
            (ResourceKind::ShaderProgram, _) => self.bound.program = Some(handle),
        }
        Ok(())
    }

    fn unbind(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Buffer => {
                self.bound.vertex_buffer = None;
                self.bound.index_buffer = None;
            }
            ResourceKind::VertexLayout => self.bound.layout = None,
            ResourceKind::Texture => self.bound.texture = None,
            ResourceKind::ShaderProgram => self.bound.program = None,
        }
    }

    fn draw_arrays(&mut self, primitive: Primitive, start: u32, count: u32) -> Result<(), BackendError> {
        let end = start
            .checked_add(count)
            .ok_or_else(|| BackendError::InvalidData("vertex range overflows".to_owned()))?;
        if let (Some(vb), Some(layout)) = (self.bound.vertex_buffer, self.bound.layout) {
            let len = self.buffer(vb)?.len;
            if let Object::VertexLayout(desc) = self.lookup(ResourceKind::VertexLayout, layout)? {
                if desc.stride > 0 && u64::from(end) * u64::from(desc.stride) > len {
                    return Err(BackendError::InvalidData(format!(
                        "vertices {start}..{end} exceed vertex buffer of {len} bytes"
                    )));
                }
            }
        }
        self.record_draw(primitive, None, start..end)
    }

    fn draw_elements(&mut self, primitive: Primitive, indices: Handle, count: u32) -> Result<(), BackendError> {
        let b = self.buffer(indices)?;
        if b.kind != BufferKind::Index {
            return Err(BackendError::InvalidData(format!("{indices} is not an index buffer")));
        }
        if u64::from(count) * 4 > b.len {
            return Err(BackendError::InvalidData(format!(
                "{count} indices exceed index buffer of {} bytes",
                b.len
            )));
        }
        self.record_draw(primitive, Some(indices), 0..count)
    }

    fn destroy(&mut self, kind: ResourceKind, handle: Handle) -> Result<(), BackendError> {
        self.lookup(kind, handle)?;
        // Pending draws hold their own references; wgpu frees on last drop.
        self.objects.remove(&handle);
        self.pipelines.retain(|k, _| k.program != handle && k.layout != handle);

        let b = &mut self.bound;
        for slot in [&mut b.program, &mut b.layout, &mut b.vertex_buffer, &mut b.index_buffer, &mut b.texture] {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(PhysicalSize::new(width, height));
    }

    fn begin_frame(&mut self) -> Result<FrameStatus, BackendError> {
        if self.frame.take().is_some() {
            log::warn!("begin_frame with a frame still open; dropping it");
        }
        self.clear_frame();

        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            return Ok(FrameStatus::Skip);
        }

        match self.gpu.acquire() {
            Ok(frame) => {
                self.frame = Some(frame);
                Ok(FrameStatus::Ready)
            }
            Err(err) => match self.gpu.handle_surface_error(err.clone()) {
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    log::debug!("surface unavailable ({err:?}); skipping frame");
                    Ok(FrameStatus::Skip)
                }
                SurfaceErrorAction::Fatal => Err(BackendError::Device(format!("surface: {err}"))),
            },
        }
    }

    fn present(&mut self) -> Result<(), BackendError> {
        let frame = self
            .frame
            .take()
            .ok_or(BackendError::MissingBinding("drawable"))?;
        let draws = std::mem::take(&mut self.draws);

        self.arena.upload(self.gpu.device(), self.gpu.queue());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("nabu frame encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("nabu scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.gpu.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &draws {
                let Some(uniforms) = self.arena.group(self.gpu.device(), &self.uniform_bgl, draw.uniform_size) else {
                    continue;
                };
                rpass.set_pipeline(&draw.pipeline);
                rpass.set_bind_group(0, &uniforms, &[draw.uniform_offset]);
                rpass.set_bind_group(1, &draw.texture, &[]);
                rpass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                match &draw.indices {
                    Some(ib) => {
                        rpass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(draw.range.clone(), 0, 0..1);
                    }
                    None => rpass.draw(draw.range.clone(), 0..1),
                }
            }
        }

        self.gpu.present(frame, encoder);
        self.arena.clear();
        Ok(())
    }

    fn abandon_frame(&mut self) {
        if self.frame.take().is_some() {
            log::debug!("frame abandoned with {} draw(s) recorded", self.draws.len());
        }
        self.clear_frame();
    }
}

/// Compiles one WGSL stage inside a validation scope so diagnostics come
/// back as [`ShaderError::Compile`] instead of reaching the uncaptured
/// error handler.
fn compile_wgsl(
    device: &wgpu::Device,
    stage: ShaderStage,
    label: &str,
    text: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(text.into()),
    });
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(ShaderError::Compile { stage, log: err.to_string() }),
        None => Ok(module),
    }
}

fn create_gpu_buffer(device: &wgpu::Device, queue: &wgpu::Queue, kind: BufferKind, data: &[u8]) -> Option<wgpu::Buffer> {
    if data.is_empty() {
        return None;
    }
    let usage = match kind {
        BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
        BufferKind::Index => wgpu::BufferUsages::INDEX,
    };
    // Copies must be 4-byte multiples.
    let size = u64::from(align_to(data.len() as u32, wgpu::COPY_BUFFER_ALIGNMENT as u32));
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("nabu buffer"),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    if size as usize == data.len() {
        queue.write_buffer(&buffer, 0, data);
    } else {
        let mut padded = data.to_vec();
        padded.resize(size as usize, 0);
        queue.write_buffer(&buffer, 0, &padded);
    }
    Some(buffer)
}

fn create_texture_object(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &ImageData,
) -> TextureObject {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("nabu texture"),
        size: wgpu::Extent3d {
            width: image.width.max(1),
            height: image.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = texture_group(device, layout, &view, sampler);
    TextureObject { width: image.width, height: image.height, texture, bind_group }
}

fn texture_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("nabu texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn write_image(queue: &wgpu::Queue, texture: &wgpu::Texture, image: &ImageData) {
    if image.width == 0 || image.height == 0 {
        return;
    }
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d { width: image.width, height: image.height, depth_or_array_layers: 1 },
    );
}

fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32 => wgpu::VertexFormat::Float32,
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

fn topology(primitive: Primitive) -> (wgpu::PrimitiveTopology, Option<wgpu::IndexFormat>) {
    match primitive {
        Primitive::Points => (wgpu::PrimitiveTopology::PointList, None),
        Primitive::Lines => (wgpu::PrimitiveTopology::LineList, None),
        Primitive::LineStrip => (wgpu::PrimitiveTopology::LineStrip, Some(wgpu::IndexFormat::Uint32)),
        Primitive::Triangles => (wgpu::PrimitiveTopology::TriangleList, None),
        Primitive::TriangleStrip => (wgpu::PrimitiveTopology::TriangleStrip, Some(wgpu::IndexFormat::Uint32)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── uniform arena ─────────────────────────────────────────────────────

    #[test]
    fn arena_slots_start_on_offset_alignment() {
        let mut arena = UniformArena::new(256);
        assert_eq!(arena.push(&[1; 240], 240), 0);
        assert_eq!(arena.push(&[2; 240], 240), 256);
        assert_eq!(arena.bytes.len(), 496);
        assert_eq!(arena.bytes[255], 0);
        assert_eq!(arena.bytes[256], 2);
    }

    #[test]
    fn arena_pads_short_snapshots_to_binding_size() {
        let mut arena = UniformArena::new(64);
        arena.push(&[7; 4], 16);
        assert_eq!(arena.bytes, [7, 7, 7, 7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        arena.clear();
        assert_eq!(arena.push(&[1; 4], 16), 0);
    }

    // ── format mapping ────────────────────────────────────────────────────

    #[test]
    fn strip_topologies_carry_an_index_format() {
        assert_eq!(topology(Primitive::Triangles), (wgpu::PrimitiveTopology::TriangleList, None));
        assert_eq!(
            topology(Primitive::TriangleStrip),
            (wgpu::PrimitiveTopology::TriangleStrip, Some(wgpu::IndexFormat::Uint32))
        );
        assert_eq!(topology(Primitive::Points).1, None);
    }

    #[test]
    fn attribute_formats_map_one_to_one() {
        for (format, expected) in [
            (AttributeFormat::Float32, wgpu::VertexFormat::Float32),
            (AttributeFormat::Float32x2, wgpu::VertexFormat::Float32x2),
            (AttributeFormat::Float32x3, wgpu::VertexFormat::Float32x3),
            (AttributeFormat::Float32x4, wgpu::VertexFormat::Float32x4),
        ] {
            assert_eq!(vertex_format(format), expected);
            assert_eq!(u64::from(format.size()), expected.size());
        }
    }

    // ── shader compilation ────────────────────────────────────────────────

    /// Any adapter without a surface, software included; `None` on machines
    /// with no usable backend.
    fn headless_device() -> Option<wgpu::Device> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok()?;
        let (device, _queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some(device)
    }

    #[test]
    fn invalid_wgsl_is_a_compile_error() {
        let Some(device) = headless_device() else {
            return;
        };
        let result = compile_wgsl(&device, ShaderStage::Vertex, "broken", "fn vs_main( -> {");
        match result {
            Err(ShaderError::Compile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn valid_wgsl_compiles() {
        let Some(device) = headless_device() else {
            return;
        };
        let text = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        assert!(compile_wgsl(&device, ShaderStage::Vertex, "ok", text).is_ok());
    }
}
