//! Image loading collaborator.
//!
//! Scenes ask an [`ImageSource`] for textures by name and receive decoded RGBA8
//! pixels; where the pixels come from (memory, a directory) is the source's concern.

mod error;
mod image_data;
mod source;

pub use error::AssetError;
pub use image_data::ImageData;
pub use source::{DirectoryImageSource, ImageSource, MemoryImageSource};
