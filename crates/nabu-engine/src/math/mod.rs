//! Linear algebra shared by the camera, scene and shader layers.
//!
//! Conventions:
//! - `f32` components, value semantics (`Copy`), no I/O
//! - column-vector convention: a matrix transforms `M * v`
//! - column-major storage, matching the layout GPU backends expect
//! - right-handed world space, camera looking down -Z
//!
//! Transform builders on [`Mat4`] compose on the right (`self * M(op)`).

mod error;
mod mat2;
mod mat3;
mod mat4;
mod vec2;
mod vec3;
mod vec4;

pub use error::MathError;
pub use mat2::Mat2;
pub use mat3::Mat3;
pub use mat4::{ClipDepth, Mat4};
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;

/// Determinant, relative to the product of the column lengths, below which
/// a matrix is treated as singular.
///
/// The column-length product bounds `|det|` from above (Hadamard), so the
/// test does not depend on the overall scale of the matrix.
pub const SINGULAR_EPSILON: f32 = 1e-6;

/// True when `det` is not finite or vanishes relative to the columns.
pub(crate) fn is_singular<const N: usize>(det: f32, cols: &[[f32; N]; N]) -> bool {
    if !det.is_finite() {
        return true;
    }
    let bound: f32 = cols
        .iter()
        .map(|c| c.iter().map(|v| v * v).sum::<f32>().sqrt())
        .product();
    bound == 0.0 || det.abs() <= SINGULAR_EPSILON * bound
}
