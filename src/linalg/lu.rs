//! LU decomposition (Doolittle algorithm, no pivoting)

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::vector::Vector;

/// LU decomposition of a square matrix: `A = L @ U`.
///
/// L is unit lower triangular, U is upper triangular; both are packed into
/// a single combined buffer (U on and above the diagonal, L strictly below
/// it) computed in one pass over the rows.
///
/// **No pivoting is performed.** A zero or near-zero pivot does not raise an
/// error; it silently propagates non-finite values through the factors.
/// Callers must pre-condition or pivot externally when the input is not
/// known to be well-conditioned.
pub struct LuDecomposition {
    lu: Vec<f64>,
    n: usize,
}

impl LuDecomposition {
    /// Decompose a square matrix.
    ///
    /// Fails with [`Error::NotSquare`] for rectangular input.
    pub fn new(a: &Matrix) -> Result<Self> {
        let n = a.require_square()?;
        let mut lu = a.as_slice().to_vec();

        for i in 0..n {
            // U entries: row i, columns j >= i
            for j in i..n {
                let mut sum = 0.0;
                for k in 0..i {
                    sum += lu[i * n + k] * lu[k * n + j];
                }
                lu[i * n + j] -= sum;
            }
            // L entries: column i, rows j > i, normalized by the pivot
            let pivot = lu[i * n + i];
            for j in (i + 1)..n {
                let mut sum = 0.0;
                for k in 0..i {
                    sum += lu[j * n + k] * lu[k * n + i];
                }
                lu[j * n + i] = (lu[j * n + i] - sum) / pivot;
            }
        }

        Ok(Self { lu, n })
    }

    /// Matrix order
    pub fn order(&self) -> usize {
        self.n
    }

    /// The packed L/U buffer as a matrix
    pub fn lu(&self) -> Matrix {
        let mut out = Matrix::zeros(self.n, self.n);
        out.as_mut_slice().copy_from_slice(&self.lu);
        out
    }

    /// Unit lower triangular factor L
    pub fn l(&self) -> Matrix {
        let n = self.n;
        let mut out = Matrix::identity(n);
        for i in 1..n {
            for j in 0..i {
                out.set(i, j, self.lu[i * n + j]);
            }
        }
        out
    }

    /// Upper triangular factor U
    pub fn u(&self) -> Matrix {
        let n = self.n;
        let mut out = Matrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                out.set(i, j, self.lu[i * n + j]);
            }
        }
        out
    }

    /// Determinant: product of the U diagonal
    pub fn determinant(&self) -> f64 {
        (0..self.n).map(|i| self.lu[i * self.n + i]).product()
    }

    /// Solve `A @ x = b` by forward then back substitution.
    ///
    /// Fails with [`Error::DimensionMismatch`] if `b.len()` disagrees with
    /// the matrix order.
    pub fn solve(&self, b: &Vector) -> Result<Vector> {
        let n = self.n;
        if b.len() != n {
            return Err(Error::DimensionMismatch {
                expected: (n, 1),
                got: (b.len(), 1),
            });
        }

        // Forward substitution against unit L
        let mut x = b.as_slice().to_vec();
        for i in 1..n {
            let mut sum = 0.0;
            for k in 0..i {
                sum += self.lu[i * n + k] * x[k];
            }
            x[i] -= sum;
        }

        // Back substitution against U
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for k in (i + 1)..n {
                sum += self.lu[i * n + k] * x[k];
            }
            x[i] = (x[i] - sum) / self.lu[i * n + i];
        }

        Ok(Vector::from_vec(x))
    }
}
