use bytemuck::Pod;

use crate::assets::ImageData;
use crate::shader::ShaderError;

use super::{
    BufferKind, GpuError, GraphicsBackend, Handle, ProgramSource, ResourceKind, VertexLayoutDesc,
};

mod sealed {
    /// Constructible only in this file; gates `GpuResource::release`.
    pub struct Token(pub(super) ());
}

/// Lifecycle capability shared by every GPU resource the kernel owns.
///
/// `bind`/`unbind` are pure state changes and may be called any number of
/// times. `destroy` releases the backend object; afterwards `handle()` is
/// `None` and every other call fails with `GpuError::Destroyed` without
/// reaching the backend.
pub trait GpuResource {
    fn kind(&self) -> ResourceKind;

    /// Live backend handle, `None` once destroyed.
    fn handle(&self) -> Option<Handle>;

    /// Forgets the handle and returns it. Only `destroy` can supply the
    /// token, so nothing else can drop a live handle on the floor.
    #[doc(hidden)]
    fn release(&mut self, token: sealed::Token) -> Option<Handle>;

    fn is_live(&self) -> bool {
        self.handle().is_some()
    }

    fn live_handle(&self) -> Result<Handle, GpuError> {
        self.handle().ok_or(GpuError::Destroyed { kind: self.kind() })
    }

    fn bind(&self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        let handle = self.live_handle()?;
        backend.bind(self.kind(), handle)?;
        Ok(())
    }

    fn unbind(&self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        self.live_handle()?;
        backend.unbind(self.kind());
        Ok(())
    }

    fn destroy(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        let kind = self.kind();
        let handle = self.release(sealed::Token(())).ok_or(GpuError::Destroyed { kind })?;
        log::trace!("destroying {kind} {handle}");
        backend.destroy(kind, handle)?;
        Ok(())
    }
}

// ── buffer ────────────────────────────────────────────────────────────────

/// Vertex or index data.
#[derive(Debug)]
pub struct Buffer {
    handle: Option<Handle>,
    kind: BufferKind,
    len: usize,
}

impl Buffer {
    /// Requests a buffer and, if `data` is given, uploads it immediately.
    pub fn create(
        backend: &mut dyn GraphicsBackend,
        kind: BufferKind,
        data: Option<&[u8]>,
    ) -> Result<Self, GpuError> {
        let handle = backend.create_buffer(kind, data)?;
        Ok(Self { handle: Some(handle), kind, len: data.map_or(0, <[u8]>::len) })
    }

    pub fn from_slice<T: Pod>(
        backend: &mut dyn GraphicsBackend,
        kind: BufferKind,
        items: &[T],
    ) -> Result<Self, GpuError> {
        Self::create(backend, kind, Some(bytemuck::cast_slice(items)))
    }

    pub fn upload(&mut self, backend: &mut dyn GraphicsBackend, data: &[u8]) -> Result<(), GpuError> {
        let handle = self.live_handle()?;
        backend.upload_buffer(handle, data)?;
        self.len = data.len();
        Ok(())
    }

    pub fn buffer_kind(&self) -> BufferKind {
        self.kind
    }

    /// Size of the last upload in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl GpuResource for Buffer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Buffer
    }

    fn handle(&self) -> Option<Handle> {
        self.handle
    }

    fn release(&mut self, _: sealed::Token) -> Option<Handle> {
        self.handle.take()
    }
}

// ── vertex layout ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct VertexLayout {
    handle: Option<Handle>,
    desc: VertexLayoutDesc,
}

impl VertexLayout {
    pub fn create(backend: &mut dyn GraphicsBackend, desc: VertexLayoutDesc) -> Result<Self, GpuError> {
        let handle = backend.create_vertex_layout(&desc)?;
        Ok(Self { handle: Some(handle), desc })
    }

    pub fn desc(&self) -> &VertexLayoutDesc {
        &self.desc
    }
}

impl GpuResource for VertexLayout {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VertexLayout
    }

    fn handle(&self) -> Option<Handle> {
        self.handle
    }

    fn release(&mut self, _: sealed::Token) -> Option<Handle> {
        self.handle.take()
    }
}

// ── texture ───────────────────────────────────────────────────────────────

/// 2D RGBA8 texture with its sampler.
#[derive(Debug)]
pub struct Texture {
    handle: Option<Handle>,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn create(backend: &mut dyn GraphicsBackend, image: Option<&ImageData>) -> Result<Self, GpuError> {
        let handle = backend.create_texture(image)?;
        let (width, height) = image.map_or((0, 0), |i| (i.width, i.height));
        Ok(Self { handle: Some(handle), width, height })
    }

    pub fn upload(&mut self, backend: &mut dyn GraphicsBackend, image: &ImageData) -> Result<(), GpuError> {
        let handle = self.live_handle()?;
        backend.upload_image(handle, image)?;
        self.width = image.width;
        self.height = image.height;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl GpuResource for Texture {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn handle(&self) -> Option<Handle> {
        self.handle
    }

    fn release(&mut self, _: sealed::Token) -> Option<Handle> {
        self.handle.take()
    }
}

// ── shader program ────────────────────────────────────────────────────────

/// A compiled and linked program.
///
/// Only constructed from a successful link, so a `ShaderProgram` that is
/// still live is always valid to bind.
#[derive(Debug)]
pub struct ShaderProgram {
    handle: Option<Handle>,
    label: String,
}

impl ShaderProgram {
    /// Compiles and links `source`. Diagnostics are logged and returned.
    pub fn create(backend: &mut dyn GraphicsBackend, source: &ProgramSource) -> Result<Self, ShaderError> {
        match backend.create_program(source) {
            Ok(handle) => {
                log::debug!("linked shader program '{}' as {handle}", source.label);
                Ok(Self { handle: Some(handle), label: source.label.clone() })
            }
            Err(e) => {
                log::error!("shader program '{}' failed: {e}", source.label);
                Err(e)
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl GpuResource for ShaderProgram {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ShaderProgram
    }

    fn handle(&self) -> Option<Handle> {
        self.handle
    }

    fn release(&mut self, _: sealed::Token) -> Option<Handle> {
        self.handle.take()
    }
}

// ── tagged union ──────────────────────────────────────────────────────────

/// Any kernel-owned GPU resource, dispatched by `match`.
#[derive(Debug)]
pub enum Resource {
    Buffer(Buffer),
    VertexLayout(VertexLayout),
    Texture(Texture),
    ShaderProgram(ShaderProgram),
}

impl GpuResource for Resource {
    fn kind(&self) -> ResourceKind {
        match self {
            Resource::Buffer(r) => r.kind(),
            Resource::VertexLayout(r) => r.kind(),
            Resource::Texture(r) => r.kind(),
            Resource::ShaderProgram(r) => r.kind(),
        }
    }

    fn handle(&self) -> Option<Handle> {
        match self {
            Resource::Buffer(r) => r.handle(),
            Resource::VertexLayout(r) => r.handle(),
            Resource::Texture(r) => r.handle(),
            Resource::ShaderProgram(r) => r.handle(),
        }
    }

    fn release(&mut self, token: sealed::Token) -> Option<Handle> {
        match self {
            Resource::Buffer(r) => r.release(token),
            Resource::VertexLayout(r) => r.release(token),
            Resource::Texture(r) => r.release(token),
            Resource::ShaderProgram(r) => r.release(token),
        }
    }
}

impl From<Buffer> for Resource {
    fn from(r: Buffer) -> Self {
        Resource::Buffer(r)
    }
}

impl From<VertexLayout> for Resource {
    fn from(r: VertexLayout) -> Self {
        Resource::VertexLayout(r)
    }
}

impl From<Texture> for Resource {
    fn from(r: Texture) -> Self {
        Resource::Texture(r)
    }
}

impl From<ShaderProgram> for Resource {
    fn from(r: ShaderProgram) -> Self {
        Resource::ShaderProgram(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingBackend;
    use crate::gpu::UniformKind;

    #[test]
    fn destroy_twice_is_reported_and_backend_sees_one_call() {
        let mut backend = RecordingBackend::new();
        let mut buf = Buffer::create(&mut backend, BufferKind::Vertex, Some(&[0u8; 16][..])).unwrap();

        assert!(buf.destroy(&mut backend).is_ok());
        assert_eq!(
            buf.destroy(&mut backend),
            Err(GpuError::Destroyed { kind: ResourceKind::Buffer })
        );
        assert_eq!(backend.stats().destroys, 1);
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn use_after_destroy_never_reaches_backend() {
        let mut backend = RecordingBackend::new();
        let mut tex = Texture::create(&mut backend, None).unwrap();
        tex.destroy(&mut backend).unwrap();

        let calls_before = backend.stats().total();
        assert!(matches!(tex.bind(&mut backend), Err(GpuError::Destroyed { .. })));
        assert!(matches!(tex.unbind(&mut backend), Err(GpuError::Destroyed { .. })));
        assert_eq!(backend.stats().total(), calls_before);
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn failed_link_yields_no_program() {
        let mut backend = RecordingBackend::new();
        backend.fail_next_program("link error: missing main");

        let source = ProgramSource::new("broken", "vs", "fs").uniform("view", UniformKind::Mat4);
        let err = ShaderProgram::create(&mut backend, &source).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn destroyed_variant_inside_enum_stays_destroyed() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::create(&mut backend, &ProgramSource::new("p", "vs", "fs")).unwrap();
        let mut res = Resource::from(program);

        res.destroy(&mut backend).unwrap();
        assert_eq!(
            res.destroy(&mut backend),
            Err(GpuError::Destroyed { kind: ResourceKind::ShaderProgram })
        );
        assert_eq!(backend.stats().destroys, 1);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn resource_enum_dispatches_to_variant() {
        let mut backend = RecordingBackend::new();
        let layout = VertexLayout::create(
            &mut backend,
            VertexLayoutDesc::packed(&[crate::gpu::AttributeFormat::Float32x3]),
        )
        .unwrap();
        let mut res = Resource::from(layout);

        assert_eq!(res.kind(), ResourceKind::VertexLayout);
        res.bind(&mut backend).unwrap();
        res.destroy(&mut backend).unwrap();
        assert!(!res.is_live());
        assert_eq!(backend.live_handles(), 0);
    }
}
