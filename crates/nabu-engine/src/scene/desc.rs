use crate::camera::CameraConfig;
use crate::geometry::MeshData;
use crate::gpu::ProgramSource;
use crate::math::{Mat4, Vec3};

use super::LightConfig;

/// Constant rotation about an axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spin {
    pub axis: Vec3,
    /// Radians per second.
    pub rate: f32,
}

#[derive(Debug, Clone)]
pub struct MeshDesc {
    pub name: String,
    pub data: MeshData,
    /// Image name passed to the scene's `ImageSource`.
    pub texture: Option<String>,
    pub transform: Mat4,
    pub spin: Option<Spin>,
}

impl MeshDesc {
    pub fn new(name: impl Into<String>, data: MeshData) -> Self {
        Self { name: name.into(), data, texture: None, transform: Mat4::IDENTITY, spin: None }
    }

    pub fn textured(mut self, image: impl Into<String>) -> Self {
        self.texture = Some(image.into());
        self
    }

    pub fn transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn spinning(mut self, axis: Vec3, rate: f32) -> Self {
        self.spin = Some(Spin { axis, rate });
        self
    }
}

/// Everything `Scene::load` needs.
#[derive(Debug, Clone)]
pub struct SceneDesc {
    pub program: ProgramSource,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub meshes: Vec<MeshDesc>,
    /// Initial drawable size in physical pixels.
    pub viewport: (u32, u32),
}

impl SceneDesc {
    pub fn new(program: ProgramSource, viewport: (u32, u32)) -> Self {
        Self {
            program,
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            meshes: Vec::new(),
            viewport,
        }
    }

    pub fn camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn light(mut self, light: LightConfig) -> Self {
        self.light = light;
        self
    }

    pub fn mesh(mut self, mesh: MeshDesc) -> Self {
        self.meshes.push(mesh);
        self
    }
}
