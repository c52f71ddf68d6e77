use std::fmt;

use crate::gpu::{GpuError, Handle, ShaderStage};

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// A stage failed to compile; `log` is the backend diagnostic text.
    Compile { stage: ShaderStage, log: String },
    /// Stages compiled but could not be linked into a program.
    Link { log: String },
    /// `update_parameters` was called for a program the block was never attached to.
    NotAttached { program: Handle },
    /// A setter named a parameter the block does not own.
    UnknownParameter(String),
    Gpu(GpuError),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { stage, log } => write!(f, "{stage} stage failed to compile:\n{log}"),
            ShaderError::Link { log } => write!(f, "program failed to link:\n{log}"),
            ShaderError::NotAttached { program } => {
                write!(f, "uniform block is not attached to program {program}")
            }
            ShaderError::UnknownParameter(name) => write!(f, "unknown shader parameter '{name}'"),
            ShaderError::Gpu(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Gpu(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpuError> for ShaderError {
    fn from(e: GpuError) -> Self {
        ShaderError::Gpu(e)
    }
}
