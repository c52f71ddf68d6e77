use core::ops::Mul;

use super::{Mat2, MathError, Vec3, is_singular};

/// 3x3 matrix, column-major.
///
/// Used for normal matrices and as the minor type of [`super::Mat4`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    pub cols: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        cols: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    #[inline]
    pub const fn from_cols(c0: [f32; 3], c1: [f32; 3], c2: [f32; 3]) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    pub fn transpose(&self) -> Mat3 {
        let mut out = [[0.0f32; 3]; 3];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = self.at(c, r);
            }
        }
        Mat3 { cols: out }
    }

    /// The 2x2 matrix left after removing `row` and `col`.
    pub fn minor(&self, row: usize, col: usize) -> Mat2 {
        let mut vals = [0.0f32; 4];
        let mut i = 0;
        for c in (0..3).filter(|&c| c != col) {
            for r in (0..3).filter(|&r| r != row) {
                vals[i] = self.at(r, c);
                i += 1;
            }
        }
        Mat2::from_cols([vals[0], vals[1]], [vals[2], vals[3]])
    }

    pub fn cofactor(&self, row: usize, col: usize) -> f32 {
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(row, col).determinant()
    }

    /// Laplace expansion along the first row.
    pub fn determinant(&self) -> f32 {
        (0..3).map(|c| self.at(0, c) * self.cofactor(0, c)).sum()
    }

    /// Inverse via cofactor/adjugate expansion.
    pub fn inverse(&self) -> Result<Mat3, MathError> {
        let det = self.determinant();
        if is_singular(det, &self.cols) {
            return Err(MathError::SingularMatrix { determinant: det });
        }
        let inv = 1.0 / det;

        // adj(M)[r][c] = cofactor(c, r)
        let mut out = [[0.0f32; 3]; 3];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = self.cofactor(c, r) * inv;
            }
        }
        Ok(Mat3 { cols: out })
    }

    pub fn approx_eq(&self, rhs: &Mat3, eps: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(rhs.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Mat3::IDENTITY
    }
}

impl Mul for Mat3 {
    type Output = Mat3;
    fn mul(self, rhs: Mat3) -> Mat3 {
        let mut out = [[0.0f32; 3]; 3];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = (0..3).map(|k| self.at(r, k) * rhs.at(k, c)).sum();
            }
        }
        Mat3 { cols: out }
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        let row = |r: usize| self.at(r, 0) * v.x + self.at(r, 1) * v.y + self.at(r, 2) * v.z;
        Vec3::new(row(0), row(1), row(2))
    }
}
