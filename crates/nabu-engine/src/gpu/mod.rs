//! GPU resource lifecycle.
//!
//! This module defines:
//! - the graphics backend capability interface (`GraphicsBackend`)
//! - the resource wrappers the kernel owns (`Buffer`, `VertexLayout`, `Texture`,
//!   `ShaderProgram`) and their tagged union `Resource`
//! - `ResourceSet`, the named bag a scene owns and tears down exactly once
//!
//! Every wrapper forgets its handle when destroyed; any later use is reported as
//! `GpuError::Destroyed` before the backend is touched.

mod backend;
mod error;
mod resource;
mod set;
mod types;

pub use backend::{FrameStatus, GraphicsBackend};
pub use error::{BackendError, GpuError};
pub use resource::{Buffer, GpuResource, Resource, ShaderProgram, Texture, VertexLayout};
pub use set::ResourceSet;
pub use types::{
    AttributeFormat,
    BufferKind,
    Handle,
    Primitive,
    ProgramSource,
    ResourceKind,
    ShaderStage,
    UniformDecl,
    UniformKind,
    UniformLocation,
    VertexAttribute,
    VertexLayoutDesc,
};
