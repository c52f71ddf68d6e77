use crate::assets::ImageData;
use crate::math::ClipDepth;
use crate::shader::{ShaderError, UniformValue};

use super::{
    BackendError, BufferKind, Handle, Primitive, ProgramSource, ResourceKind, UniformLocation,
    VertexLayoutDesc,
};

/// Outcome of `begin_frame`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// A drawable was acquired; draw and present.
    Ready,
    /// No drawable this tick (surface lost/outdated/minimised); skip drawing.
    Skip,
}

/// Graphics backend capability interface consumed by the kernel.
///
/// The kernel never sees backend objects, only [`Handle`]s. Backends own the
/// "currently bound" state: `draw_*` calls use whatever program, vertex
/// layout, vertex buffer and texture were bound last.
///
/// Contract:
/// - handles are issued by `create_*` and stay valid until `destroy`
/// - any call naming a destroyed or unknown handle returns
///   `BackendError::UnknownHandle`
/// - `set_uniform` targets the given program, bound or not
pub trait GraphicsBackend {
    /// Depth range projection matrices must target.
    fn clip_depth(&self) -> ClipDepth {
        ClipDepth::NegativeOneToOne
    }

    fn create_buffer(&mut self, kind: BufferKind, data: Option<&[u8]>) -> Result<Handle, BackendError>;

    fn upload_buffer(&mut self, buffer: Handle, data: &[u8]) -> Result<(), BackendError>;

    fn create_vertex_layout(&mut self, desc: &VertexLayoutDesc) -> Result<Handle, BackendError>;

    fn create_texture(&mut self, image: Option<&ImageData>) -> Result<Handle, BackendError>;

    fn upload_image(&mut self, texture: Handle, image: &ImageData) -> Result<(), BackendError>;

    /// Compiles every stage and links them.
    ///
    /// Diagnostics are returned in the error; no handle is issued on failure.
    fn create_program(&mut self, source: &ProgramSource) -> Result<Handle, ShaderError>;

    /// Resolves a uniform by name. Unknown names resolve to `None`.
    fn uniform_location(&mut self, program: Handle, name: &str) -> Option<UniformLocation>;

    fn set_uniform(
        &mut self,
        program: Handle,
        location: UniformLocation,
        value: &UniformValue,
    ) -> Result<(), BackendError>;

    fn bind(&mut self, kind: ResourceKind, handle: Handle) -> Result<(), BackendError>;

    /// Clears the current binding for `kind`. Idempotent.
    fn unbind(&mut self, kind: ResourceKind);

    fn draw_arrays(&mut self, primitive: Primitive, start: u32, count: u32) -> Result<(), BackendError>;

    fn draw_elements(&mut self, primitive: Primitive, indices: Handle, count: u32) -> Result<(), BackendError>;

    fn destroy(&mut self, kind: ResourceKind, handle: Handle) -> Result<(), BackendError>;

    /// Surface size changed; drawable-dependent state is rebuilt.
    fn resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn begin_frame(&mut self) -> Result<FrameStatus, BackendError>;

    /// Submits the frame's draws and presents the drawable.
    fn present(&mut self) -> Result<(), BackendError>;

    /// Drops the draws recorded since `begin_frame` and releases the drawable
    /// without presenting it.
    fn abandon_frame(&mut self) {}
}
