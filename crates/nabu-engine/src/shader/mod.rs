//! Shader parameter binding.
//!
//! A [`UniformBlock`] is the set of named parameters one object (camera, light,
//! mesh) feeds into shader programs. It caches uniform locations per program
//! and pushes only the values that changed since the last push to that program.

mod block;
mod error;
mod value;

pub use block::UniformBlock;
pub use error::ShaderError;
pub use value::UniformValue;
