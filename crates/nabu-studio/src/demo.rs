use std::path::Path;

use nabu_engine::assets::{DirectoryImageSource, ImageData, ImageSource, MemoryImageSource};
use nabu_engine::camera::{CAMERA_POSITION, CameraConfig, PROJECTION, VIEW};
use nabu_engine::geometry;
use nabu_engine::gpu::{ProgramSource, UniformKind};
use nabu_engine::math::{Mat4, Vec3};
use nabu_engine::scene::{
    LIGHT_AMBIENT_STRENGTH, LIGHT_COLOR, LIGHT_HARDNESS, LIGHT_POSITION, LIGHT_SPECULAR_STRENGTH,
    LightConfig, MODEL, MeshDesc, SceneDesc,
};

const LIT_SHADER: &str = include_str!("../shaders/lit.wgsl");

/// Image name both demo meshes sample.
pub const CHECKER: &str = "checker.png";

/// Lit, textured program; uniforms declared in `Uniforms` struct order.
pub fn lit_program() -> ProgramSource {
    ProgramSource::new("lit", LIT_SHADER, LIT_SHADER)
        .uniform(MODEL, UniformKind::Mat4)
        .uniform(VIEW, UniformKind::Mat4)
        .uniform(PROJECTION, UniformKind::Mat4)
        .uniform(LIGHT_COLOR, UniformKind::Vec3)
        .uniform(LIGHT_POSITION, UniformKind::Vec3)
        .uniform(LIGHT_AMBIENT_STRENGTH, UniformKind::Float)
        .uniform(LIGHT_SPECULAR_STRENGTH, UniformKind::Float)
        .uniform(LIGHT_HARDNESS, UniformKind::Float)
        .uniform(CAMERA_POSITION, UniformKind::Vec3)
}

/// A spinning cube above a floor.
pub fn scene(viewport: (u32, u32)) -> SceneDesc {
    let camera = CameraConfig {
        position: Vec3::new(0.0, -0.5, -4.0),
        ..CameraConfig::default()
    };
    let light = LightConfig {
        position: Vec3::new(2.0, 3.0, 2.5),
        ..LightConfig::default()
    };

    SceneDesc::new(lit_program(), viewport)
        .camera(camera)
        .light(light)
        .mesh(
            MeshDesc::new("cube", geometry::cube(1.0))
                .textured(CHECKER)
                .spinning(Vec3::new(0.3, 1.0, 0.0), 0.8),
        )
        .mesh(
            MeshDesc::new("floor", geometry::plane(8.0))
                .textured(CHECKER)
                .transform(Mat4::translation(0.0, -1.0, 0.0)),
        )
}

/// Images from `dir`, or a generated checkerboard when none is given.
pub fn images(dir: Option<&Path>) -> Box<dyn ImageSource> {
    match dir {
        Some(dir) => {
            log::info!("loading textures from {}", dir.display());
            Box::new(DirectoryImageSource::new(dir))
        }
        None => Box::new(MemoryImageSource::new().with(
            CHECKER,
            ImageData::checkerboard(256, 8, [230, 230, 230, 255], [40, 90, 160, 255]),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nabu_engine::core::{Renderer, TickOutcome};
    use nabu_engine::device::RecordingBackend;
    use nabu_engine::time::FrameClock;
    use std::time::{Duration, Instant};

    #[test]
    fn demo_scene_renders_headless() {
        let mut renderer = Renderer::new(RecordingBackend::new());
        renderer.load_scene(&scene((640, 480)), images(None).as_ref()).unwrap();

        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let time = clock.tick_at(start + Duration::from_millis(16));
        assert_eq!(renderer.tick(time), TickOutcome::Presented);

        let backend = renderer.backend();
        assert_eq!(backend.draws().len(), 2);
        assert!(backend.violations().is_empty());
        // One texture shared by both meshes.
        assert_eq!(backend.draws()[0].texture, backend.draws()[1].texture);
    }

    #[test]
    fn every_declared_uniform_is_fed() {
        let mut renderer = Renderer::new(RecordingBackend::new());
        renderer.load_scene(&scene((640, 480)), images(None).as_ref()).unwrap();
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        renderer.tick(clock.tick_at(start + Duration::from_millis(16)));

        let backend = renderer.backend();
        let program = backend.draws()[0].program;
        for decl in &lit_program().uniforms {
            assert!(
                backend.last_uniform(program, &decl.name).is_some(),
                "uniform '{}' never pushed",
                decl.name
            );
        }
    }

    #[test]
    fn missing_texture_directory_fails_the_load() {
        let mut renderer = Renderer::new(RecordingBackend::new());
        let images = images(Some(Path::new("/nonexistent/nabu-textures")));
        assert!(renderer.load_scene(&scene((640, 480)), images.as_ref()).is_err());
        assert_eq!(renderer.backend().live_handles(), 0);
    }
}
