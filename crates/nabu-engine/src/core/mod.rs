//! Core engine-facing contracts.
//!
//! This module defines the per-tick context threaded through scene code and the
//! `Renderer`, which owns a backend and a scene and runs one tick at a time. The
//! runtime drives it from the render thread; tests drive it directly.

mod context;
mod renderer;

pub use context::RenderContext;
pub use renderer::{Renderer, TickOutcome};
