use std::fmt;

/// Failure of a linear-algebra operation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MathError {
    /// `inverse()` was asked for a matrix whose determinant is (close to) zero.
    SingularMatrix { determinant: f32 },
}

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathError::SingularMatrix { determinant } => {
                write!(f, "matrix is singular (determinant {determinant:e})")
            }
        }
    }
}

impl std::error::Error for MathError {}
