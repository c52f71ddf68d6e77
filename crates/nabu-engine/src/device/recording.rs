use std::collections::HashMap;

use crate::assets::ImageData;
use crate::gpu::{
    BackendError, BufferKind, FrameStatus, GraphicsBackend, Handle, Primitive, ProgramSource,
    ResourceKind, UniformLocation, VertexLayoutDesc,
};
use crate::math::ClipDepth;
use crate::shader::{ShaderError, UniformValue};

/// Backend call counters.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct CallStats {
    pub creates: usize,
    pub uploads: usize,
    pub lookups: usize,
    pub uniform_pushes: usize,
    pub binds: usize,
    pub unbinds: usize,
    pub draws: usize,
    pub destroys: usize,
    pub frames: usize,
}

impl CallStats {
    pub fn total(&self) -> usize {
        self.creates
            + self.uploads
            + self.lookups
            + self.uniform_pushes
            + self.binds
            + self.unbinds
            + self.draws
            + self.destroys
            + self.frames
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UniformPush {
    pub program: Handle,
    pub location: UniformLocation,
    pub value: UniformValue,
}

/// A draw with the bindings that were current when it was issued.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub primitive: Primitive,
    pub program: Handle,
    pub layout: Handle,
    pub vertex_buffer: Handle,
    pub texture: Option<Handle>,
    pub indices: Option<Handle>,
    pub start: u32,
    pub count: u32,
}

#[derive(Debug, Clone)]
enum Object {
    Buffer { kind: BufferKind, len: usize },
    VertexLayout,
    Texture { width: u32, height: u32 },
    Program { uniforms: Vec<String> },
}

impl Object {
    fn kind(&self) -> ResourceKind {
        match self {
            Object::Buffer { .. } => ResourceKind::Buffer,
            Object::VertexLayout => ResourceKind::VertexLayout,
            Object::Texture { .. } => ResourceKind::Texture,
            Object::Program { .. } => ResourceKind::ShaderProgram,
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

/// Headless [`GraphicsBackend`] that records instead of rendering.
///
/// Handles are issued from 1 upward and never reused. Any call naming a
/// destroyed or unknown handle fails with `UnknownHandle` and is kept in
/// [`RecordingBackend::violations`], which a correct kernel leaves empty.
#[derive(Debug)]
pub struct RecordingBackend {
    next_handle: u32,
    live: HashMap<Handle, Object>,
    destroyed: Vec<Handle>,
    bound: Bindings,
    stats: CallStats,
    pushes: Vec<UniformPush>,
    draws: Vec<DrawCall>,
    violations: Vec<String>,
    fail_next_program: Option<String>,
    clip_depth: ClipDepth,
    size: (u32, u32),
    in_frame: bool,
    abandoned: usize,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            live: HashMap::new(),
            destroyed: Vec::new(),
            bound: Bindings::default(),
            stats: CallStats::default(),
            pushes: Vec::new(),
            draws: Vec::new(),
            violations: Vec::new(),
            fail_next_program: None,
            clip_depth: ClipDepth::NegativeOneToOne,
            size: (0, 0),
            in_frame: false,
            abandoned: 0,
        }
    }

    pub fn with_clip_depth(mut self, depth: ClipDepth) -> Self {
        self.clip_depth = depth;
        self
    }

    /// Makes the next `create_program` fail to link with `log`.
    pub fn fail_next_program(&mut self, log: impl Into<String>) {
        self.fail_next_program = Some(log.into());
    }

    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Destroyed handles, oldest first.
    pub fn destroy_order(&self) -> &[Handle] {
        &self.destroyed
    }

    pub fn uniform_pushes(&self) -> &[UniformPush] {
        &self.pushes
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Frames begun and then abandoned instead of presented.
    pub fn abandoned_frames(&self) -> usize {
        self.abandoned
    }

    /// Most recent value pushed to the uniform `name` of `program`.
    pub fn last_uniform(&self, program: Handle, name: &str) -> Option<UniformValue> {
        let location = match self.live.get(&program)? {
            Object::Program { uniforms } => uniforms.iter().position(|u| u == name)?,
            _ => return None,
        };
        self.pushes
            .iter()
            .rev()
            .find(|p| p.program == program && p.location.0 as usize == location)
            .map(|p| p.value)
    }

    /// Clears counters and logs but keeps every live object.
    pub fn clear_log(&mut self) {
        self.stats = CallStats::default();
        self.pushes.clear();
        self.draws.clear();
    }

    fn issue(&mut self, object: Object) -> Result<Handle, BackendError> {
        // Zero after wrap-around: the handle space is spent.
        let handle = Handle::new(self.next_handle)
            .ok_or_else(|| BackendError::Device("handle space exhausted".to_owned()))?;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.live.insert(handle, object);
        Ok(handle)
    }

    fn lookup(&mut self, kind: ResourceKind, handle: Handle, op: &str) -> Result<&mut Object, BackendError> {
        match self.live.get(&handle) {
            Some(obj) if obj.kind() == kind => {}
            Some(obj) => {
                let found = obj.kind();
                self.violations.push(format!("{op}: {handle} is a {found}, not a {kind}"));
                return Err(BackendError::UnknownHandle { kind, handle });
            }
            None => {
                let why = if self.destroyed.contains(&handle) { "destroyed" } else { "unknown" };
                self.violations.push(format!("{op}: {why} {kind} {handle}"));
                return Err(BackendError::UnknownHandle { kind, handle });
            }
        }
        self.live
            .get_mut(&handle)
            .ok_or(BackendError::UnknownHandle { kind, handle })
    }

    fn require_live_binding(&mut self, kind: ResourceKind, handle: Option<Handle>, what: &'static str) -> Result<Handle, BackendError> {
        let handle = handle.ok_or(BackendError::MissingBinding(what))?;
        self.lookup(kind, handle, "draw")?;
        Ok(handle)
    }

    fn record_draw(&mut self, primitive: Primitive, indices: Option<Handle>, start: u32, count: u32) -> Result<(), BackendError> {
        let program = self.require_live_binding(ResourceKind::ShaderProgram, self.bound.program, "program")?;
        let layout = self.require_live_binding(ResourceKind::VertexLayout, self.bound.layout, "vertex layout")?;
        let vertex_buffer =
            self.require_live_binding(ResourceKind::Buffer, self.bound.vertex_buffer, "vertex buffer")?;
        let texture = match self.bound.texture {
            Some(t) => Some(self.require_live_binding(ResourceKind::Texture, Some(t), "texture")?),
            None => None,
        };
        self.draws.push(DrawCall { primitive, program, layout, vertex_buffer, texture, indices, start, count });
        Ok(())
    }
}

impl GraphicsBackend for RecordingBackend {
    fn clip_depth(&self) -> ClipDepth {
        self.clip_depth
    }

    fn create_buffer(&mut self, kind: BufferKind, data: Option<&[u8]>) -> Result<Handle, BackendError> {
        self.stats.creates += 1;
        let len = data.map_or(0, <[u8]>::len);
        if kind == BufferKind::Index && len % 4 != 0 {
            return Err(BackendError::InvalidData(format!("index data of {len} bytes is not u32-aligned")));
        }
        self.issue(Object::Buffer { kind, len })
    }

    fn upload_buffer(&mut self, buffer: Handle, data: &[u8]) -> Result<(), BackendError> {
        self.stats.uploads += 1;
        if let Object::Buffer { len, .. } = self.lookup(ResourceKind::Buffer, buffer, "upload_buffer")? {
            *len = data.len();
        }
        Ok(())
    }

    fn create_vertex_layout(&mut self, desc: &VertexLayoutDesc) -> Result<Handle, BackendError> {
        self.stats.creates += 1;
        if let Some(attr) = desc.attributes.iter().find(|a| a.offset + a.format.size() > desc.stride) {
            return Err(BackendError::InvalidData(format!(
                "attribute {} overruns stride {}",
                attr.location, desc.stride
            )));
        }
        self.issue(Object::VertexLayout)
    }

    fn create_texture(&mut self, image: Option<&ImageData>) -> Result<Handle, BackendError> {
        self.stats.creates += 1;
        let (width, height) = image.map_or((0, 0), |i| (i.width, i.height));
        self.issue(Object::Texture { width, height })
    }

    fn upload_image(&mut self, texture: Handle, image: &ImageData) -> Result<(), BackendError> {
        self.stats.uploads += 1;
        if let Object::Texture { width, height } = self.lookup(ResourceKind::Texture, texture, "upload_image")? {
            *width = image.width;
            *height = image.height;
        }
        Ok(())
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<Handle, ShaderError> {
        self.stats.creates += 1;
        if let Some(log) = self.fail_next_program.take() {
            return Err(ShaderError::Link { log });
        }
        let uniforms = source.uniforms.iter().map(|u| u.name.clone()).collect();
        self.issue(Object::Program { uniforms })
            .map_err(|e| ShaderError::Gpu(e.into()))
    }

    fn uniform_location(&mut self, program: Handle, name: &str) -> Option<UniformLocation> {
        self.stats.lookups += 1;
        match self.lookup(ResourceKind::ShaderProgram, program, "uniform_location").ok()? {
            Object::Program { uniforms } => uniforms
                .iter()
                .position(|u| u == name)
                .map(|i| UniformLocation(i as u32)),
            _ => None,
        }
    }

    fn set_uniform(
        &mut self,
        program: Handle,
        location: UniformLocation,
        value: &UniformValue,
    ) -> Result<(), BackendError> {
        self.stats.uniform_pushes += 1;
        if let Object::Program { uniforms } = self.lookup(ResourceKind::ShaderProgram, program, "set_uniform")? {
            if location.0 as usize >= uniforms.len() {
                return Err(BackendError::InvalidData(format!("no uniform at location {}", location.0)));
            }
        }
        self.pushes.push(UniformPush { program, location, value: *value });
        Ok(())
    }

    fn bind(&mut self, kind: ResourceKind, handle: Handle) -> Result<(), BackendError> {
        self.stats.binds += 1;
        let buffer_kind = match self.lookup(kind, handle, "bind")? {
            Object::Buffer { kind, .. } => Some(*kind),
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
        self.stats.unbinds += 1;
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
        self.stats.draws += 1;
        self.record_draw(primitive, None, start, count)
    }

    fn draw_elements(&mut self, primitive: Primitive, indices: Handle, count: u32) -> Result<(), BackendError> {
        self.stats.draws += 1;
        match self.lookup(ResourceKind::Buffer, indices, "draw_elements")? {
            Object::Buffer { kind: BufferKind::Index, len } => {
                if count as usize * 4 > *len {
                    return Err(BackendError::InvalidData(format!(
                        "{count} indices exceed index buffer of {len} bytes"
                    )));
                }
            }
            _ => return Err(BackendError::InvalidData(format!("{indices} is not an index buffer"))),
        }
        self.record_draw(primitive, Some(indices), 0, count)
    }

    fn destroy(&mut self, kind: ResourceKind, handle: Handle) -> Result<(), BackendError> {
        self.stats.destroys += 1;
        self.lookup(kind, handle, "destroy")?;
        self.live.remove(&handle);
        self.destroyed.push(handle);

        let b = &mut self.bound;
        for slot in [&mut b.program, &mut b.layout, &mut b.vertex_buffer, &mut b.index_buffer, &mut b.texture] {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn begin_frame(&mut self) -> Result<FrameStatus, BackendError> {
        if self.in_frame {
            self.violations.push("begin_frame while a frame is open".to_owned());
        }
        self.in_frame = true;
        Ok(FrameStatus::Ready)
    }

    fn present(&mut self) -> Result<(), BackendError> {
        if !self.in_frame {
            self.violations.push("present without begin_frame".to_owned());
        }
        self.in_frame = false;
        self.stats.frames += 1;
        Ok(())
    }

    fn abandon_frame(&mut self) {
        self.in_frame = false;
        self.abandoned += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{AttributeFormat, UniformKind};

    fn h(raw: u32) -> Handle {
        Handle::new(raw).unwrap()
    }

    #[test]
    fn handles_are_sequential_and_never_reused() {
        let mut b = RecordingBackend::new();
        let first = b.create_buffer(BufferKind::Vertex, None).unwrap();
        b.destroy(ResourceKind::Buffer, first).unwrap();
        let second = b.create_texture(None).unwrap();
        assert_eq!((first.raw(), second.raw()), (1, 2));
    }

    #[test]
    fn use_of_destroyed_handle_is_a_violation() {
        let mut b = RecordingBackend::new();
        let buf = b.create_buffer(BufferKind::Vertex, None).unwrap();
        b.destroy(ResourceKind::Buffer, buf).unwrap();

        assert_eq!(
            b.bind(ResourceKind::Buffer, buf),
            Err(BackendError::UnknownHandle { kind: ResourceKind::Buffer, handle: buf })
        );
        assert!(b.destroy(ResourceKind::Buffer, buf).is_err());
        assert_eq!(b.violations().len(), 2);
        assert!(b.violations()[0].contains("destroyed"));
    }

    #[test]
    fn kind_mismatch_is_a_violation() {
        let mut b = RecordingBackend::new();
        let tex = b.create_texture(None).unwrap();
        assert!(b.bind(ResourceKind::Buffer, tex).is_err());
        assert!(b.bind(ResourceKind::Texture, h(99)).is_err());
        assert_eq!(b.violations().len(), 2);
    }

    #[test]
    fn draw_records_current_bindings() {
        let mut b = RecordingBackend::new();
        let prog = b
            .create_program(&ProgramSource::new("p", "vs", "fs").uniform("model", UniformKind::Mat4))
            .unwrap();
        let layout = b
            .create_vertex_layout(&VertexLayoutDesc::packed(&[AttributeFormat::Float32x3]))
            .unwrap();
        let vbo = b.create_buffer(BufferKind::Vertex, Some(&[0u8; 36][..])).unwrap();
        let ibo = b.create_buffer(BufferKind::Index, Some(&[0u8; 12][..])).unwrap();

        assert_eq!(
            b.draw_arrays(Primitive::Triangles, 0, 3),
            Err(BackendError::MissingBinding("program"))
        );
        for (kind, handle) in [
            (ResourceKind::ShaderProgram, prog),
            (ResourceKind::VertexLayout, layout),
            (ResourceKind::Buffer, vbo),
        ] {
            b.bind(kind, handle).unwrap();
        }
        b.draw_elements(Primitive::Triangles, ibo, 3).unwrap();

        let draw = b.draws()[0];
        assert_eq!((draw.program, draw.vertex_buffer, draw.indices), (prog, vbo, Some(ibo)));
        assert_eq!(draw.texture, None);
        assert!(b.draw_elements(Primitive::Triangles, ibo, 4).is_err());
    }

    #[test]
    fn uniform_locations_follow_declaration_order() {
        let mut b = RecordingBackend::new();
        let source = ProgramSource::new("p", "vs", "fs")
            .uniform("view", UniformKind::Mat4)
            .uniform("light.color", UniformKind::Vec3);
        let prog = b.create_program(&source).unwrap();

        assert_eq!(b.uniform_location(prog, "light.color"), Some(UniformLocation(1)));
        assert_eq!(b.uniform_location(prog, "fog"), None);

        b.set_uniform(prog, UniformLocation(1), &UniformValue::Float(2.0)).unwrap();
        assert_eq!(b.last_uniform(prog, "light.color"), Some(UniformValue::Float(2.0)));
        assert!(b.set_uniform(prog, UniformLocation(5), &UniformValue::Int(0)).is_err());
    }

    #[test]
    fn present_without_begin_is_flagged() {
        let mut b = RecordingBackend::new();
        b.present().unwrap();
        assert_eq!(b.violations().len(), 1);
        assert_eq!(b.begin_frame(), Ok(FrameStatus::Ready));
        b.present().unwrap();
        assert_eq!(b.stats().frames, 2);
        assert_eq!(b.violations().len(), 1);
    }
}
