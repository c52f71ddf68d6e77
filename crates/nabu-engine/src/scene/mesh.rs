use crate::gpu::{
    GpuError, GpuResource, GraphicsBackend, Handle, Primitive, Resource, ResourceKind, ResourceSet,
};
use crate::math::Mat4;
use crate::shader::UniformBlock;

use super::{SceneError, Spin};

pub const MODEL: &str = "model";

/// Resource-set keys of one mesh's GPU objects.
#[derive(Debug, Clone)]
pub(super) struct MeshKeys {
    pub vertices: String,
    pub layout: String,
    pub indices: Option<String>,
    pub texture: Option<String>,
}

/// A drawable mesh inside a scene.
///
/// GPU objects live in the scene's `ResourceSet`; the mesh refers to them by
/// key so that a torn-down scene cannot reach a destroyed handle.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    keys: MeshKeys,
    primitive: Primitive,
    count: u32,
    base: Mat4,
    spin: Option<Spin>,
    model: Mat4,
    uniforms: UniformBlock,
}

impl Mesh {
    pub(super) fn new(
        name: String,
        keys: MeshKeys,
        primitive: Primitive,
        count: u32,
        base: Mat4,
        spin: Option<Spin>,
    ) -> Self {
        Self {
            name,
            keys,
            primitive,
            count,
            base,
            spin,
            model: base,
            uniforms: UniformBlock::new().with(MODEL, base),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn spin(&self) -> Option<Spin> {
        self.spin
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformBlock {
        &mut self.uniforms
    }

    /// Sets the model transform to the base transform spun to `time` seconds.
    pub fn update(&mut self, time: f32) {
        let Some(spin) = self.spin else {
            return;
        };
        self.model = self.base.rotate(spin.rate * time, spin.axis);
        if let Err(e) = self.uniforms.set(MODEL, self.model) {
            log::error!("mesh '{}' uniform: {e}", self.name);
        }
    }

    /// Pushes this mesh's uniforms, binds its objects and issues the draw.
    ///
    /// `shared_model` forces the model matrix out even when unchanged, for
    /// when other meshes overwrote the same program slot since the last draw.
    pub(super) fn draw(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        resources: &ResourceSet,
        program: Handle,
        shared_model: bool,
    ) -> Result<(), SceneError> {
        if shared_model {
            self.uniforms.invalidate(program);
        }
        self.uniforms.update_parameters(backend, program)?;

        lookup(resources, &self.keys.layout, ResourceKind::VertexLayout)?.bind(backend)?;
        lookup(resources, &self.keys.vertices, ResourceKind::Buffer)?.bind(backend)?;
        match &self.keys.texture {
            Some(key) => lookup(resources, key, ResourceKind::Texture)?.bind(backend)?,
            None => backend.unbind(ResourceKind::Texture),
        }

        match &self.keys.indices {
            Some(key) => {
                let indices = lookup(resources, key, ResourceKind::Buffer)?.live_handle()?;
                backend
                    .draw_elements(self.primitive, indices, self.count)
                    .map_err(GpuError::from)?;
            }
            None => backend
                .draw_arrays(self.primitive, 0, self.count)
                .map_err(GpuError::from)?,
        }
        Ok(())
    }
}

/// Finds a live resource by key; a missing key means the scene was torn down.
pub(super) fn lookup<'a>(
    resources: &'a ResourceSet,
    key: &str,
    kind: ResourceKind,
) -> Result<&'a Resource, GpuError> {
    resources
        .get(key)
        .filter(|r| r.kind() == kind)
        .ok_or(GpuError::Destroyed { kind })
}
