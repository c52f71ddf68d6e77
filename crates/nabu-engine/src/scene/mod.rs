//! Scene: camera, light, one shader program and its meshes.
//!
//! A scene owns every GPU resource it creates in a [`crate::gpu::ResourceSet`]
//! and releases them exactly once in `teardown`.

mod desc;
mod error;
mod light;
mod mesh;
mod world;

pub use desc::{MeshDesc, SceneDesc, Spin};
pub use error::SceneError;
pub use light::{
    Light, LightConfig, LIGHT_AMBIENT_STRENGTH, LIGHT_COLOR, LIGHT_HARDNESS, LIGHT_POSITION,
    LIGHT_SPECULAR_STRENGTH,
};
pub use mesh::{Mesh, MODEL};
pub use world::Scene;
