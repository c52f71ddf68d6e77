//! Graphics backends.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue and configuring the surface
//! - `WgpuBackend`, the [`GraphicsBackend`](crate::gpu::GraphicsBackend) used on screen
//! - `RecordingBackend`, a headless backend that records calls for tests and tooling

mod context;
mod frame;
mod init;
mod recording;
mod surface;
mod uniform_layout;
mod wgpu_backend;

pub use context::Gpu;
pub use frame::GpuFrame;
pub use init::GpuInit;
pub use recording::{CallStats, DrawCall, RecordingBackend, UniformPush};
pub use surface::SurfaceErrorAction;
pub use wgpu_backend::{FRAGMENT_ENTRY, VERTEX_ENTRY, WgpuBackend};
