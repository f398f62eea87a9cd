//! Error types for linmat

use thiserror::Error;

/// Result type alias using linmat's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in linmat operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Dimensions are not conformable for an operation.
    ///
    /// Vectors are reported as `(len, 1)`.
    #[error("Dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// Expected (rows, cols)
        expected: (usize, usize),
        /// Actual (rows, cols)
        got: (usize, usize),
    },

    /// A square-only operation was given a rectangular matrix
    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// No usable pivot was found during elimination
    #[error("Matrix is singular: largest available pivot {pivot:e} is below threshold")]
    Singular {
        /// Magnitude of the best pivot candidate
        pivot: f64,
    },

    /// QR decomposition of a column-rank-deficient matrix
    #[error("Matrix is rank deficient: R diagonal vanishes at column {column}")]
    RankDeficient {
        /// First column whose R diagonal fell below threshold
        column: usize,
    },

    /// An iterative algorithm exceeded its iteration guard
    #[error("{op} failed to converge after {iterations} iterations")]
    ConvergenceFailure {
        /// The operation that failed
        op: &'static str,
        /// Iterations performed before giving up
        iterations: usize,
    },

    /// A buffer-adopting constructor was given a mismatched buffer
    #[error("Invalid shape: {rows}x{cols} needs {product} elements, buffer has {length}")]
    InvalidShape {
        /// Requested row count
        rows: usize,
        /// Requested column count
        cols: usize,
        /// `rows * cols`
        product: usize,
        /// Actual buffer length
        length: usize,
    },
}

impl Error {
    /// Create a dimension mismatch error from matrix shapes
    pub fn dimension_mismatch(expected: (usize, usize), got: (usize, usize)) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Create a not-square error
    pub fn not_square(rows: usize, cols: usize) -> Self {
        Self::NotSquare { rows, cols }
    }

    /// Create an invalid-shape error
    pub fn invalid_shape(rows: usize, cols: usize, length: usize) -> Self {
        Self::InvalidShape {
            rows,
            cols,
            product: rows * cols,
            length,
        }
    }
}
