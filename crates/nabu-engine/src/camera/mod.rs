//! First-person camera.
//!
//! The camera owns its view matrix, a [`Projection`] rebuilt from the viewport
//! aspect, and the uniform block that feeds both to shader programs.

mod first_person;
mod projection;

pub use first_person::{Camera, CameraConfig, CAMERA_POSITION, PROJECTION, VIEW};
pub use projection::Projection;
