use core::ops::Mul;

use super::{Mat3, MathError, Vec3, Vec4, is_singular};

/// Clip-space depth range produced by projection matrices.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ClipDepth {
    /// OpenGL convention: near plane maps to -1, far plane to +1.
    #[default]
    NegativeOneToOne,
    /// Direct3D/Metal/wgpu convention: near plane maps to 0, far plane to 1.
    ZeroToOne,
}

impl ClipDepth {
    /// Matrix converting `NegativeOneToOne` clip space into this convention.
    pub fn correction(self) -> Mat4 {
        match self {
            ClipDepth::NegativeOneToOne => Mat4::IDENTITY,
            ClipDepth::ZeroToOne => Mat4::from_cols(
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 0.5, 0.0],
                [0.0, 0.0, 0.5, 1.0],
            ),
        }
    }
}

/// 4x4 matrix, column-major, column-vector convention.
///
/// The transform builders (`translate`, `rotate_*`, `scale`, `perspective`,
/// `orthographic`) return `self * M(op)`: the new transform is applied to
/// vertices *before* everything already in `self`. Camera code relies on
/// this order; do not flip it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub const fn from_cols(c0: [f32; 4], c1: [f32; 4], c2: [f32; 4], c3: [f32; 4]) -> Self {
        Self { cols: [c0, c1, c2, c3] }
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    /// Column-major array, ready for upload.
    #[inline]
    pub const fn to_cols_array(&self) -> [[f32; 4]; 4] {
        self.cols
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = self.at(c, r);
            }
        }
        Mat4 { cols: out }
    }

    /// The 3x3 matrix left after removing `row` and `col`.
    pub fn minor(&self, row: usize, col: usize) -> Mat3 {
        let mut out = [[0.0f32; 3]; 3];
        for (oc, c) in (0..4).filter(|&c| c != col).enumerate() {
            for (or, r) in (0..4).filter(|&r| r != row).enumerate() {
                out[oc][or] = self.at(r, c);
            }
        }
        Mat3 { cols: out }
    }

    pub fn cofactor(&self, row: usize, col: usize) -> f32 {
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(row, col).determinant()
    }

    /// Laplace expansion along the first row.
    pub fn determinant(&self) -> f32 {
        (0..4).map(|c| self.at(0, c) * self.cofactor(0, c)).sum()
    }

    /// Inverse via cofactor/adjugate expansion.
    ///
    /// Returns [`MathError::SingularMatrix`] instead of dividing by a
    /// vanishing determinant.
    pub fn inverse(&self) -> Result<Mat4, MathError> {
        let det = self.determinant();
        if is_singular(det, &self.cols) {
            return Err(MathError::SingularMatrix { determinant: det });
        }
        let inv = 1.0 / det;

        // adj(M)[r][c] = cofactor(c, r)
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = self.cofactor(c, r) * inv;
            }
        }
        Ok(Mat4 { cols: out })
    }

    pub fn approx_eq(&self, rhs: &Mat4, eps: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(rhs.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }

    /// Transforms a point (`w = 1`) and divides by the resulting `w`.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = *self * Vec4::from_point(p);
        if v.w != 0.0 && v.w != 1.0 { v.truncate() / v.w } else { v.truncate() }
    }

    /// Transforms a direction (`w = 0`); translation is ignored.
    pub fn transform_vector(&self, d: Vec3) -> Vec3 {
        (*self * Vec4::from_direction(d)).truncate()
    }

    // ── standalone transforms ─────────────────────────────────────────────

    pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_cols(
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        )
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_cols(
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    pub fn rotation_x(radians: f32) -> Mat4 {
        let (s, c) = radians.sin_cos();
        Mat4::from_cols(
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    pub fn rotation_y(radians: f32) -> Mat4 {
        let (s, c) = radians.sin_cos();
        Mat4::from_cols(
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    pub fn rotation_z(radians: f32) -> Mat4 {
        let (s, c) = radians.sin_cos();
        Mat4::from_cols(
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Rotation about an arbitrary axis (Rodrigues' formula).
    ///
    /// A zero axis yields the identity.
    pub fn rotation_axis(radians: f32, axis: Vec3) -> Mat4 {
        let a = axis.normalize();
        if a == Vec3::ZERO {
            return Mat4::IDENTITY;
        }
        let (s, c) = radians.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (a.x, a.y, a.z);

        Mat4::from_cols(
            [t * x * x + c, t * x * y + s * z, t * x * z - s * y, 0.0],
            [t * x * y - s * z, t * y * y + c, t * y * z + s * x, 0.0],
            [t * x * z + s * y, t * y * z - s * x, t * z * z + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Right-handed perspective projection; `fov_y` in radians.
    pub fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32, depth: ClipDepth) -> Mat4 {
        let f = 1.0 / (fov_y * 0.5).tan();
        let gl = Mat4::from_cols(
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (far + near) / (near - far), -1.0],
            [0.0, 0.0, 2.0 * far * near / (near - far), 0.0],
        );
        depth.correction() * gl
    }

    /// Right-handed orthographic projection of a `width` x `height` box
    /// centred on the view axis.
    pub fn orthographic_rh(width: f32, height: f32, near: f32, far: f32, depth: ClipDepth) -> Mat4 {
        let gl = Mat4::from_cols(
            [2.0 / width, 0.0, 0.0, 0.0],
            [0.0, 2.0 / height, 0.0, 0.0],
            [0.0, 0.0, -2.0 / (far - near), 0.0],
            [0.0, 0.0, -(far + near) / (far - near), 1.0],
        );
        depth.correction() * gl
    }

    // ── composing builders: self * M(op) ──────────────────────────────────

    pub fn translate(self, x: f32, y: f32, z: f32) -> Mat4 {
        self * Mat4::translation(x, y, z)
    }

    pub fn scale(self, x: f32, y: f32, z: f32) -> Mat4 {
        self * Mat4::scaling(x, y, z)
    }

    pub fn rotate_x(self, radians: f32) -> Mat4 {
        self * Mat4::rotation_x(radians)
    }

    pub fn rotate_y(self, radians: f32) -> Mat4 {
        self * Mat4::rotation_y(radians)
    }

    pub fn rotate_z(self, radians: f32) -> Mat4 {
        self * Mat4::rotation_z(radians)
    }

    pub fn rotate(self, radians: f32, axis: Vec3) -> Mat4 {
        self * Mat4::rotation_axis(radians, axis)
    }

    /// Composes a `NegativeOneToOne` perspective projection.
    pub fn perspective(self, fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        self * Mat4::perspective_rh(fov_y, aspect, near, far, ClipDepth::NegativeOneToOne)
    }

    /// Composes a `NegativeOneToOne` orthographic projection.
    pub fn orthographic(self, width: f32, height: f32, near: f32, far: f32) -> Mat4 {
        self * Mat4::orthographic_rh(width, height, near, far, ClipDepth::NegativeOneToOne)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.at(r, k) * rhs.at(k, c)).sum();
            }
        }
        Mat4 { cols: out }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        let row = |r: usize| {
            self.at(r, 0) * v.x + self.at(r, 1) * v.y + self.at(r, 2) * v.z + self.at(r, 3) * v.w
        };
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4};

    const EPS: f32 = 1e-5;

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn inverse_of_invertible_matrices_round_trips() {
        let samples = [
            Mat4::IDENTITY,
            Mat4::IDENTITY.translate(1.0, -2.0, 3.5),
            Mat4::IDENTITY.rotate_x(0.3).rotate_y(1.2).translate(4.0, 0.0, -1.0),
            Mat4::IDENTITY.scale(2.0, 0.5, 3.0).rotate(0.7, Vec3::new(1.0, 1.0, 0.0)),
            Mat4::perspective_rh(FRAC_PI_3, 16.0 / 9.0, 0.1, 100.0, ClipDepth::NegativeOneToOne),
            Mat4::from_cols(
                [2.0, 0.0, 1.0, 3.0],
                [1.0, 3.0, 0.0, 1.0],
                [0.0, 1.0, 4.0, 2.0],
                [1.0, 2.0, 1.0, 5.0],
            ),
        ];
        for m in samples {
            let inv = m.inverse().expect("invertible");
            assert!((m * inv).approx_eq(&Mat4::IDENTITY, 1e-4), "{m:?}");
        }
    }

    #[test]
    fn singular_matrix_is_reported_not_nan() {
        let flat = Mat4::IDENTITY.scale(1.0, 0.0, 1.0);
        assert!(matches!(flat.inverse(), Err(MathError::SingularMatrix { .. })));

        let dup_cols = Mat4::from_cols(
            [1.0, 2.0, 3.0, 4.0],
            [1.0, 2.0, 3.0, 4.0],
            [0.0, 1.0, 0.0, 1.0],
            [5.0, 0.0, 1.0, 1.0],
        );
        assert!(dup_cols.inverse().is_err());
    }

    #[test]
    fn small_scale_matrices_are_still_invertible() {
        let samples = [
            Mat4::orthographic_rh(1920.0, 1080.0, 0.1, 1000.0, ClipDepth::NegativeOneToOne),
            Mat4::orthographic_rh(1920.0, 1080.0, 0.1, 1000.0, ClipDepth::ZeroToOne),
            Mat4::scaling(0.001, 0.001, 0.001),
            Mat4::scaling(0.001, 0.002, 0.001).translate(3.0, 0.0, -2.0),
        ];
        for m in samples {
            let inv = m.inverse().expect("invertible");
            assert!((m * inv).approx_eq(&Mat4::IDENTITY, 1e-3), "{m:?}");
        }
    }

    #[test]
    fn non_finite_matrix_is_singular() {
        let m = Mat4::scaling(f32::NAN, 1.0, 1.0);
        assert!(matches!(m.inverse(), Err(MathError::SingularMatrix { .. })));
    }

    #[test]
    fn determinant_of_scaling_is_product_of_factors() {
        assert!((Mat4::scaling(2.0, 3.0, 4.0).determinant() - 24.0).abs() < EPS);
    }

    // ── composition order ─────────────────────────────────────────────────

    #[test]
    fn builders_compose_on_the_right() {
        let built = Mat4::IDENTITY.translate(1.0, 2.0, 3.0).rotate_y(0.5);
        let explicit = Mat4::translation(1.0, 2.0, 3.0) * Mat4::rotation_y(0.5);
        assert!(built.approx_eq(&explicit, EPS));
    }

    #[test]
    fn transform_order_is_not_commutative() {
        let p = Vec3::new(0.0, 0.0, 1.0);

        let translate_then_rotate = Mat4::IDENTITY.translate(1.0, 0.0, 0.0).rotate_y(FRAC_PI_2);
        let rotate_then_translate = Mat4::IDENTITY.rotate_y(FRAC_PI_2).translate(1.0, 0.0, 0.0);

        let a = translate_then_rotate.transform_point(p);
        let b = rotate_then_translate.transform_point(p);

        // Rotation applies first: (0,0,1) -> (1,0,0), then +x.
        assert!(a.approx_eq(Vec3::new(2.0, 0.0, 0.0), EPS), "{a:?}");
        // Translation applies first: (0,0,1) -> (1,0,1), then rotated.
        assert!(b.approx_eq(Vec3::new(1.0, 0.0, -1.0), EPS), "{b:?}");
        assert!(!a.approx_eq(b, 0.1));
    }

    // ── rotations ─────────────────────────────────────────────────────────

    #[test]
    fn axis_rotation_matches_principal_axes() {
        for angle in [0.25, FRAC_PI_4, 2.0] {
            assert!(Mat4::rotation_axis(angle, Vec3::X).approx_eq(&Mat4::rotation_x(angle), EPS));
            assert!(Mat4::rotation_axis(angle, Vec3::Y).approx_eq(&Mat4::rotation_y(angle), EPS));
            assert!(Mat4::rotation_axis(angle, Vec3::Z).approx_eq(&Mat4::rotation_z(angle), EPS));
        }
    }

    #[test]
    fn zero_axis_rotation_is_identity() {
        let m = Mat4::IDENTITY.translate(1.0, 0.0, 0.0);
        assert_eq!(m.rotate(1.0, Vec3::ZERO), m);
    }

    #[test]
    fn rotation_z_turns_x_into_y() {
        let v = Mat4::rotation_z(FRAC_PI_2).transform_vector(Vec3::X);
        assert!(v.approx_eq(Vec3::Y, EPS));
    }

    #[test]
    fn vectors_ignore_translation() {
        let m = Mat4::translation(5.0, 5.0, 5.0);
        assert_eq!(m.transform_vector(Vec3::X), Vec3::X);
        assert_eq!(m.transform_point(Vec3::X), Vec3::new(6.0, 5.0, 5.0));
    }

    // ── projections ───────────────────────────────────────────────────────

    #[test]
    fn perspective_maps_near_and_far_planes_gl() {
        let (near, far) = (0.1, 100.0);
        let p = Mat4::IDENTITY.perspective(FRAC_PI_3, 1.5, near, far);

        let n = p.transform_point(Vec3::new(0.0, 0.0, -near));
        let f = p.transform_point(Vec3::new(0.0, 0.0, -far));
        assert!((n.z - -1.0).abs() < 1e-4, "{n:?}");
        assert!((f.z - 1.0).abs() < 1e-4, "{f:?}");
    }

    #[test]
    fn perspective_maps_near_and_far_planes_zero_to_one() {
        let (near, far) = (0.5, 50.0);
        let p = Mat4::perspective_rh(FRAC_PI_4, 1.0, near, far, ClipDepth::ZeroToOne);

        let n = p.transform_point(Vec3::new(0.0, 0.0, -near));
        let f = p.transform_point(Vec3::new(0.0, 0.0, -far));
        assert!(n.z.abs() < 1e-4, "{n:?}");
        assert!((f.z - 1.0).abs() < 1e-4, "{f:?}");
    }

    #[test]
    fn orthographic_maps_box_corners() {
        let o = Mat4::IDENTITY.orthographic(8.0, 4.0, 1.0, 11.0);
        let a = o.transform_point(Vec3::new(4.0, 2.0, -1.0));
        let b = o.transform_point(Vec3::new(-4.0, -2.0, -11.0));
        assert!(a.approx_eq(Vec3::new(1.0, 1.0, -1.0), EPS), "{a:?}");
        assert!(b.approx_eq(Vec3::new(-1.0, -1.0, 1.0), EPS), "{b:?}");
    }
}
