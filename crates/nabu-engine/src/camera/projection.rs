use crate::math::{ClipDepth, Mat4};

/// Perspective projection tied to a viewport aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    fov_y: f32,
    near: f32,
    far: f32,
    aspect: f32,
    depth: ClipDepth,
    matrix: Mat4,
}

impl Projection {
    /// A zero-sized viewport falls back to a square aspect.
    pub fn new(fov_y: f32, near: f32, far: f32, width: u32, height: u32, depth: ClipDepth) -> Self {
        let aspect = aspect_of(width, height).unwrap_or(1.0);
        Self {
            fov_y,
            near,
            far,
            aspect,
            depth,
            matrix: Mat4::perspective_rh(fov_y, aspect, near, far, depth),
        }
    }

    /// Rebuilds the matrix for a new viewport.
    ///
    /// Returns `false` (and keeps the old aspect) for a zero-sized viewport,
    /// which happens while the window is minimised.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let Some(aspect) = aspect_of(width, height) else {
            return false;
        };
        self.aspect = aspect;
        self.matrix = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far, self.depth);
        true
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn clip_depth(&self) -> ClipDepth {
        self.depth
    }
}

fn aspect_of(width: u32, height: u32) -> Option<f32> {
    (width > 0 && height > 0).then(|| width as f32 / height as f32)
}
