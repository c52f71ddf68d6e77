use crate::assets::ImageSource;
use crate::camera::Camera;
use crate::core::RenderContext;
use crate::geometry::Vertex;
use crate::gpu::{
    Buffer, BufferKind, GpuError, GpuResource, GraphicsBackend, ResourceKind, ResourceSet,
    ShaderProgram, Texture, VertexLayout,
};
use crate::input::{InputEvent, KeyBindings};

use super::mesh::{lookup, MeshKeys};
use super::{Light, Mesh, MeshDesc, SceneDesc, SceneError};

const PROGRAM: &str = "program";

/// A loaded scene.
///
/// Created by [`Scene::load`], updated and drawn once per tick, and released
/// by [`Scene::teardown`]. After teardown every draw fails with
/// `GpuError::Destroyed` without reaching the backend.
#[derive(Debug)]
pub struct Scene {
    camera: Camera,
    light: Light,
    meshes: Vec<Mesh>,
    resources: ResourceSet,
}

impl Scene {
    /// Compiles the program, uploads every mesh and texture and attaches all
    /// uniform blocks.
    ///
    /// A missing texture is fatal. On any failure, whatever was already
    /// created is destroyed before the error is returned.
    pub fn load(
        backend: &mut dyn GraphicsBackend,
        desc: &SceneDesc,
        images: &dyn ImageSource,
    ) -> Result<Scene, SceneError> {
        let mut resources = ResourceSet::new();
        match Self::build(backend, desc, images, &mut resources) {
            Ok((camera, light, meshes)) => {
                log::info!(
                    "scene loaded: {} mesh(es), {} GPU resource(s)",
                    meshes.len(),
                    resources.len()
                );
                Ok(Scene { camera, light, meshes, resources })
            }
            Err(e) => {
                log::error!("scene load failed: {e}");
                if let Err(cleanup) = resources.destroy_all(backend) {
                    log::warn!("cleanup after failed load: {cleanup}");
                }
                Err(e)
            }
        }
    }

    fn build(
        backend: &mut dyn GraphicsBackend,
        desc: &SceneDesc,
        images: &dyn ImageSource,
        resources: &mut ResourceSet,
    ) -> Result<(Camera, Light, Vec<Mesh>), SceneError> {
        let program = ShaderProgram::create(backend, &desc.program)?;
        let program_handle = program.live_handle()?;
        resources.insert(PROGRAM, program);

        let (width, height) = desc.viewport;
        let mut camera = Camera::new(&desc.camera, width, height, backend.clip_depth());
        camera.uniforms_mut().attach(backend, program_handle);

        let mut light = Light::new(desc.light.clone());
        light.uniforms_mut().attach(backend, program_handle);

        let mut meshes = Vec::with_capacity(desc.meshes.len());
        for (i, mesh_desc) in desc.meshes.iter().enumerate() {
            let mut mesh = Self::upload_mesh(backend, i, mesh_desc, images, resources)?;
            mesh.uniforms_mut().attach(backend, program_handle);
            meshes.push(mesh);
        }
        Ok((camera, light, meshes))
    }

    fn upload_mesh(
        backend: &mut dyn GraphicsBackend,
        index: usize,
        desc: &MeshDesc,
        images: &dyn ImageSource,
        resources: &mut ResourceSet,
    ) -> Result<Mesh, SceneError> {
        let prefix = format!("mesh{index}");
        let keys = MeshKeys {
            vertices: format!("{prefix}.vertices"),
            layout: format!("{prefix}.layout"),
            indices: desc.data.indices.as_ref().map(|_| format!("{prefix}.indices")),
            texture: desc.texture.as_ref().map(|name| format!("texture:{name}")),
        };

        let vertices = Buffer::from_slice(backend, BufferKind::Vertex, &desc.data.vertices)?;
        resources.insert(keys.vertices.clone(), vertices);

        let layout = VertexLayout::create(backend, Vertex::layout())?;
        resources.insert(keys.layout.clone(), layout);

        if let (Some(key), Some(indices)) = (&keys.indices, &desc.data.indices) {
            let buffer = Buffer::from_slice(backend, BufferKind::Index, indices)?;
            resources.insert(key.clone(), buffer);
        }

        // Meshes naming the same image share one texture.
        if let (Some(key), Some(name)) = (&keys.texture, &desc.texture) {
            if resources.get(key).is_none() {
                let image = images.load(name)?;
                log::debug!("texture '{name}' {}x{}", image.width, image.height);
                let texture = Texture::create(backend, Some(&image))?;
                resources.insert(key.clone(), texture);
            }
        }

        Ok(Mesh::new(
            desc.name.clone(),
            keys,
            desc.data.primitive,
            desc.data.draw_count(),
            desc.transform,
            desc.spin,
        ))
    }

    /// Advances time-driven state (mesh spin) to `ctx.time`.
    pub fn update(&mut self, ctx: &mut RenderContext<'_>) {
        let time = ctx.time.time;
        for mesh in &mut self.meshes {
            mesh.update(time);
        }
    }

    /// Binds the program, pushes dirty uniforms and draws every mesh.
    pub fn draw(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), SceneError> {
        let backend = &mut *ctx.backend;
        let program = lookup(&self.resources, PROGRAM, ResourceKind::ShaderProgram)?;
        program.bind(backend)?;
        let program = program.live_handle()?;

        self.camera.uniforms_mut().update_parameters(backend, program)?;
        self.light.uniforms_mut().update_parameters(backend, program)?;

        let shared_model = self.meshes.len() > 1;
        for mesh in &mut self.meshes {
            mesh.draw(backend, &self.resources, program, shared_model)?;
        }
        Ok(())
    }

    pub fn handle_input(&mut self, event: &InputEvent, bindings: &KeyBindings) -> bool {
        self.camera.handle_input(event, bindings)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    /// Destroys every GPU resource the scene created. Idempotent.
    pub fn teardown(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        if self.resources.is_empty() {
            return Ok(());
        }
        let count = self.resources.len();
        let program = self.resources.get(PROGRAM).and_then(|p| p.handle());
        if let Some(program) = program {
            self.camera.uniforms_mut().detach(program);
            self.light.uniforms_mut().detach(program);
            for mesh in &mut self.meshes {
                mesh.uniforms_mut().detach(program);
            }
        }
        let result = self.resources.destroy_all(backend);
        log::info!("scene torn down ({count} GPU resource(s))");
        result
    }

    pub fn is_torn_down(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn light_mut(&mut self) -> &mut Light {
        &mut self.light
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if !self.resources.is_empty() {
            log::warn!(
                "scene dropped without teardown; {} GPU resource(s) leaked",
                self.resources.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, ImageData, MemoryImageSource};
    use crate::camera::{PROJECTION, VIEW};
    use crate::device::RecordingBackend;
    use crate::geometry::{cube, plane};
    use crate::gpu::{ProgramSource, UniformKind};
    use crate::math::{Mat4, Vec3};
    use crate::scene::{LIGHT_COLOR, MODEL};
    use crate::shader::{ShaderError, UniformValue};
    use crate::time::FrameClock;
    use std::time::{Duration, Instant};

    fn lit_program() -> ProgramSource {
        ProgramSource::new("lit", "vs", "fs")
            .uniform(MODEL, UniformKind::Mat4)
            .uniform(VIEW, UniformKind::Mat4)
            .uniform(PROJECTION, UniformKind::Mat4)
            .uniform(LIGHT_COLOR, UniformKind::Vec3)
    }

    fn images() -> MemoryImageSource {
        MemoryImageSource::new().with("crate.png", ImageData::solid(2, 2, [200, 150, 100, 255]))
    }

    fn one_cube() -> SceneDesc {
        SceneDesc::new(lit_program(), (640, 480)).mesh(MeshDesc::new("cube", cube(1.0)).textured("crate.png"))
    }

    fn frame(backend: &mut RecordingBackend, scene: &mut Scene, clock: &mut FrameClock, at: Instant) {
        let mut ctx = RenderContext { backend, time: clock.tick_at(at) };
        scene.update(&mut ctx);
        scene.draw(&mut ctx).unwrap();
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn every_created_handle_is_destroyed_once() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::load(&mut backend, &one_cube(), &images()).unwrap();
        // program, vertices, layout, indices, texture
        assert_eq!(backend.live_handles(), 5);

        scene.teardown(&mut backend).unwrap();
        assert_eq!(backend.live_handles(), 0);
        assert_eq!(backend.destroy_order().len(), 5);
        assert!(scene.is_torn_down());

        let calls = backend.stats().total();
        scene.teardown(&mut backend).unwrap();
        assert_eq!(backend.stats().total(), calls);
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn draw_after_teardown_never_reaches_backend() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::load(&mut backend, &one_cube(), &images()).unwrap();
        scene.teardown(&mut backend).unwrap();

        let calls = backend.stats().total();
        let mut ctx = RenderContext { backend: &mut backend, time: FrameClock::new().tick() };
        let err = scene.draw(&mut ctx).unwrap_err();
        assert!(matches!(err, SceneError::Gpu(GpuError::Destroyed { .. })));
        assert_eq!(backend.stats().total(), calls);
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn missing_texture_is_fatal_and_leaks_nothing() {
        let mut backend = RecordingBackend::new();
        let desc = SceneDesc::new(lit_program(), (640, 480))
            .mesh(MeshDesc::new("floor", plane(10.0)).textured("grass.png"));

        let err = Scene::load(&mut backend, &desc, &images()).unwrap_err();
        assert_eq!(err, SceneError::Asset(AssetError::NotFound { name: "grass.png".into() }));
        assert_eq!(backend.live_handles(), 0);
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn link_failure_surfaces_as_shader_error() {
        let mut backend = RecordingBackend::new();
        backend.fail_next_program("undefined symbol");
        let err = Scene::load(&mut backend, &one_cube(), &images()).unwrap_err();
        assert!(matches!(err, SceneError::Shader(ShaderError::Link { .. })));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn meshes_share_textures_by_name() {
        let mut backend = RecordingBackend::new();
        let desc = one_cube().mesh(MeshDesc::new("cube2", cube(0.5)).textured("crate.png"));
        let mut scene = Scene::load(&mut backend, &desc, &images()).unwrap();
        // program + 2 x (vertices, layout, indices) + 1 texture
        assert_eq!(backend.live_handles(), 8);
        scene.teardown(&mut backend).unwrap();
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn static_scene_pushes_uniforms_only_once() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::load(&mut backend, &one_cube(), &images()).unwrap();
        let mut clock = FrameClock::new();
        let t0 = Instant::now();

        frame(&mut backend, &mut scene, &mut clock, t0);
        assert_eq!(backend.uniform_pushes().len(), 4);
        assert_eq!(backend.draws().len(), 1);

        frame(&mut backend, &mut scene, &mut clock, t0 + Duration::from_millis(16));
        assert_eq!(backend.uniform_pushes().len(), 4);
        assert_eq!(backend.draws().len(), 2);
        assert!(backend.draws()[1].texture.is_some());

        scene.teardown(&mut backend).unwrap();
        let stats = *backend.stats();
        assert!(stats.creates > 0);
        assert_eq!(stats.creates, stats.destroys);
        assert_eq!(backend.live_handles(), 0);
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn multiple_meshes_each_push_their_model() {
        let mut backend = RecordingBackend::new();
        let desc = SceneDesc::new(lit_program(), (640, 480))
            .mesh(MeshDesc::new("a", cube(1.0)))
            .mesh(MeshDesc::new("b", cube(1.0)).transform(Mat4::translation(2.0, 0.0, 0.0)));
        let mut scene = Scene::load(&mut backend, &desc, &images()).unwrap();
        let mut clock = FrameClock::new();
        let t0 = Instant::now();

        frame(&mut backend, &mut scene, &mut clock, t0);
        backend.clear_log();
        frame(&mut backend, &mut scene, &mut clock, t0 + Duration::from_millis(16));

        let program = backend.draws()[0].program;
        assert_eq!(backend.uniform_pushes().len(), 2);
        assert_eq!(
            backend.last_uniform(program, MODEL),
            Some(UniformValue::Mat4(Mat4::translation(2.0, 0.0, 0.0)))
        );
        assert_eq!(backend.draws()[0].texture, None);
        scene.teardown(&mut backend).unwrap();
    }

    #[test]
    fn spinning_mesh_follows_scene_time() {
        let mut backend = RecordingBackend::new();
        let desc = SceneDesc::new(lit_program(), (640, 480))
            .mesh(MeshDesc::new("spinner", cube(1.0)).spinning(Vec3::Y, 1.0));
        let mut scene = Scene::load(&mut backend, &desc, &images()).unwrap();
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        frame(&mut backend, &mut scene, &mut clock, t0 + Duration::from_millis(500));
        let expected = Mat4::IDENTITY.rotate(0.5, Vec3::Y);
        assert!(scene.meshes()[0].model().approx_eq(&expected, 1e-6));

        let program = backend.draws()[0].program;
        match backend.last_uniform(program, MODEL) {
            Some(UniformValue::Mat4(m)) => assert!(m.approx_eq(&expected, 1e-6)),
            other => panic!("unexpected model uniform {other:?}"),
        }
        scene.teardown(&mut backend).unwrap();
    }

    #[test]
    fn camera_movement_reaches_view_uniform() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::load(&mut backend, &one_cube(), &images()).unwrap();
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        frame(&mut backend, &mut scene, &mut clock, t0);

        scene.camera_mut().set_position(Vec3::new(0.0, 0.0, -5.0));
        scene.camera_mut().update_view_matrix(0.0);
        frame(&mut backend, &mut scene, &mut clock, t0 + Duration::from_millis(16));

        let program = backend.draws()[0].program;
        assert_eq!(
            backend.last_uniform(program, VIEW),
            Some(UniformValue::Mat4(Mat4::translation(0.0, 0.0, -5.0)))
        );
        scene.teardown(&mut backend).unwrap();
    }
}
