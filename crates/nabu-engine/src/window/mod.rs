//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, forwards input to the render thread
//! and shuts the render loop down before the scene's GPU resources go.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, SceneSetup};
