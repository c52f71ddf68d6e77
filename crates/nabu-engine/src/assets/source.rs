use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{AssetError, ImageData};

/// Supplies decoded images by name.
pub trait ImageSource {
    fn load(&self, name: &str) -> Result<ImageData, AssetError>;
}

/// Images registered up front, for procedural textures and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryImageSource {
    images: HashMap<String, ImageData>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, image: ImageData) -> Self {
        self.insert(name, image);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, image: ImageData) {
        self.images.insert(name.into(), image);
    }
}

impl ImageSource for MemoryImageSource {
    fn load(&self, name: &str) -> Result<ImageData, AssetError> {
        self.images.get(name).cloned().ok_or_else(|| {
            log::warn!("image '{name}' is not registered");
            AssetError::NotFound { name: name.to_owned() }
        })
    }
}

/// Decodes PNG/JPEG files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryImageSource {
    root: PathBuf,
}

impl DirectoryImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageSource for DirectoryImageSource {
    fn load(&self, name: &str) -> Result<ImageData, AssetError> {
        let path = self.root.join(name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("image '{}' not found", path.display());
                return Err(AssetError::NotFound { name: name.to_owned() });
            }
            Err(e) => {
                return Err(AssetError::Decode { name: name.to_owned(), message: e.to_string() });
            }
        };

        let img = image::load_from_memory(&bytes)
            .map_err(|e| AssetError::Decode { name: name.to_owned(), message: e.to_string() })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        log::debug!("decoded '{}' ({width}x{height})", path.display());
        Ok(ImageData { width, height, rgba: img.into_raw() })
    }
}
