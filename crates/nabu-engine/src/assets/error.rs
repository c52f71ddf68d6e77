use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    NotFound { name: String },
    /// The file exists but is not an image the decoder understands.
    Decode { name: String, message: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound { name } => write!(f, "asset '{name}' not found"),
            AssetError::Decode { name, message } => {
                write!(f, "asset '{name}' could not be decoded: {message}")
            }
        }
    }
}

impl std::error::Error for AssetError {}
