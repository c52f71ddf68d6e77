//! Nabu engine crate.
//!
//! A small real-time rendering kernel: column-major math, GPU resource
//! lifecycle behind a backend interface, dirty-tracked shader parameters, a
//! first-person camera, a lit/textured mesh scene and a fixed-rate render loop
//! on its own thread. The wgpu backend and winit runtime put it on screen;
//! `RecordingBackend` runs it headless.

pub mod assets;
pub mod camera;
pub mod core;
pub mod device;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod logging;
pub mod math;
pub mod scene;
pub mod shader;
pub mod time;
pub mod window;
