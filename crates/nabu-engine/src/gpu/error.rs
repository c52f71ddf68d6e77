use std::fmt;

use super::{Handle, ResourceKind};

/// Failure reported by a graphics backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The handle was never issued or has already been destroyed.
    UnknownHandle { kind: ResourceKind, handle: Handle },
    /// A draw was issued without the state it needs (program, layout, buffer).
    MissingBinding(&'static str),
    /// Uploaded data does not fit the target (size, dimensions, alignment).
    InvalidData(String),
    /// Device-level failure (lost device, out of memory, validation).
    Device(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::UnknownHandle { kind, handle } => {
                write!(f, "unknown {kind} handle {handle}")
            }
            BackendError::MissingBinding(what) => write!(f, "draw issued with no {what} bound"),
            BackendError::InvalidData(msg) => write!(f, "invalid upload: {msg}"),
            BackendError::Device(msg) => write!(f, "device error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Failure of a kernel-side resource operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuError {
    /// The resource was used after `destroy()`; the backend was not called.
    Destroyed { kind: ResourceKind },
    Backend(BackendError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::Destroyed { kind } => write!(f, "{kind} used after destroy"),
            GpuError::Backend(e) => write!(f, "backend: {e}"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::Backend(e) => Some(e),
            GpuError::Destroyed { .. } => None,
        }
    }
}

impl From<BackendError> for GpuError {
    fn from(e: BackendError) -> Self {
        GpuError::Backend(e)
    }
}
