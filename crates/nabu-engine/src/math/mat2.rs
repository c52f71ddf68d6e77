use core::ops::Mul;

use super::{MathError, Vec2, is_singular};

/// 2x2 matrix, column-major.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat2 {
    pub cols: [[f32; 2]; 2],
}

impl Mat2 {
    pub const IDENTITY: Mat2 = Mat2 { cols: [[1.0, 0.0], [0.0, 1.0]] };

    #[inline]
    pub const fn from_cols(c0: [f32; 2], c1: [f32; 2]) -> Self {
        Self { cols: [c0, c1] }
    }

    /// Element at `row`, `col`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    pub fn transpose(&self) -> Mat2 {
        Mat2::from_cols([self.cols[0][0], self.cols[1][0]], [self.cols[0][1], self.cols[1][1]])
    }

    pub fn determinant(&self) -> f32 {
        self.at(0, 0) * self.at(1, 1) - self.at(0, 1) * self.at(1, 0)
    }

    /// Inverse via the adjugate: swap the diagonal, negate the off-diagonal.
    pub fn inverse(&self) -> Result<Mat2, MathError> {
        let det = self.determinant();
        if is_singular(det, &self.cols) {
            return Err(MathError::SingularMatrix { determinant: det });
        }
        let inv = 1.0 / det;
        Ok(Mat2::from_cols(
            [self.at(1, 1) * inv, -self.at(1, 0) * inv],
            [-self.at(0, 1) * inv, self.at(0, 0) * inv],
        ))
    }

    pub fn approx_eq(&self, rhs: &Mat2, eps: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(rhs.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Default for Mat2 {
    fn default() -> Self {
        Mat2::IDENTITY
    }
}

impl Mul for Mat2 {
    type Output = Mat2;
    fn mul(self, rhs: Mat2) -> Mat2 {
        let mut out = [[0.0f32; 2]; 2];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = self.at(r, 0) * rhs.at(0, c) + self.at(r, 1) * rhs.at(1, c);
            }
        }
        Mat2 { cols: out }
    }
}

impl Mul<Vec2> for Mat2 {
    type Output = Vec2;
    fn mul(self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.at(0, 0) * v.x + self.at(0, 1) * v.y,
            self.at(1, 0) * v.x + self.at(1, 1) * v.y,
        )
    }
}
