use std::fmt;

use crate::assets::AssetError;
use crate::gpu::GpuError;
use crate::shader::ShaderError;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    Asset(AssetError),
    Gpu(GpuError),
    Shader(ShaderError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Asset(e) => write!(f, "scene asset: {e}"),
            SceneError::Gpu(e) => write!(f, "scene gpu: {e}"),
            SceneError::Shader(e) => write!(f, "scene shader: {e}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Asset(e) => Some(e),
            SceneError::Gpu(e) => Some(e),
            SceneError::Shader(e) => Some(e),
        }
    }
}

impl From<AssetError> for SceneError {
    fn from(e: AssetError) -> Self {
        SceneError::Asset(e)
    }
}

impl From<GpuError> for SceneError {
    fn from(e: GpuError) -> Self {
        SceneError::Gpu(e)
    }
}

impl From<ShaderError> for SceneError {
    fn from(e: ShaderError) -> Self {
        SceneError::Shader(e)
    }
}
