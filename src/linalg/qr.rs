//! QR decomposition using Householder reflections

use super::hypot;
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Minimum R-diagonal magnitude for the matrix to count as full rank
const MIN_R_DIAGONAL: f64 = 1e-20;

/// QR decomposition: `A = Q @ R` with Q orthogonal and R upper triangular.
///
/// Computed column by column with Householder reflections that zero the
/// sub-diagonal of each column. The reflector vectors are stored in the
/// lower-triangular part of the working buffer; the R diagonal is kept
/// separately with its sign negated per the Householder convention. Q is
/// assembled lazily by replaying the reflections against an identity matrix
/// in reverse column order.
///
/// Construction fails with [`Error::RankDeficient`] when any R diagonal
/// magnitude falls below threshold, so every constructed value is full
/// column rank.
pub struct QrDecomposition {
    qr: Vec<f64>,
    rdiag: Vec<f64>,
    m: usize,
    n: usize,
}

impl QrDecomposition {
    /// Decompose a matrix with `rows >= cols`.
    ///
    /// A matrix with `rows < cols` cannot have full column rank and is
    /// reported as [`Error::RankDeficient`].
    pub fn new(a: &Matrix) -> Result<Self> {
        let (m, n) = (a.rows(), a.cols());
        let mut qr = a.as_slice().to_vec();
        let mut rdiag = vec![0.0; n];

        for k in 0..n {
            // Overflow-safe 2-norm of the k-th column below the diagonal
            let mut nrm = 0.0;
            for i in k..m {
                nrm = hypot(nrm, qr[i * n + k]);
            }

            if nrm != 0.0 {
                // Form the Householder vector in place
                if qr[k * n + k] < 0.0 {
                    nrm = -nrm;
                }
                for i in k..m {
                    qr[i * n + k] /= nrm;
                }
                qr[k * n + k] += 1.0;

                // Apply the reflection to the remaining columns
                for j in (k + 1)..n {
                    let mut s = 0.0;
                    for i in k..m {
                        s += qr[i * n + k] * qr[i * n + j];
                    }
                    s = -s / qr[k * n + k];
                    for i in k..m {
                        qr[i * n + j] += s * qr[i * n + k];
                    }
                }
            }
            rdiag[k] = -nrm;
        }

        if let Some(column) = rdiag.iter().position(|d| d.abs() < MIN_R_DIAGONAL) {
            return Err(Error::RankDeficient { column });
        }

        Ok(Self { qr, rdiag, m, n })
    }

    /// Input row count
    pub fn rows(&self) -> usize {
        self.m
    }

    /// Input column count
    pub fn cols(&self) -> usize {
        self.n
    }

    /// Whether every R diagonal magnitude passed the rank threshold.
    ///
    /// Always true for a constructed value; rank-deficient input fails in
    /// [`QrDecomposition::new`].
    pub fn is_full_rank(&self) -> bool {
        self.rdiag.iter().all(|d| d.abs() >= MIN_R_DIAGONAL)
    }

    /// Householder reflector vectors, zero above the diagonal
    pub fn h(&self) -> Matrix {
        let (m, n) = (self.m, self.n);
        let mut out = Matrix::zeros(m, n);
        for i in 0..m {
            for j in 0..=i.min(n - 1) {
                out.set(i, j, self.qr[i * n + j]);
            }
        }
        out
    }

    /// Upper triangular factor R (n-by-n)
    pub fn r(&self) -> Matrix {
        let n = self.n;
        let mut out = Matrix::zeros(n, n);
        for i in 0..n {
            out.set(i, i, self.rdiag[i]);
            for j in (i + 1)..n {
                out.set(i, j, self.qr[i * n + j]);
            }
        }
        out
    }

    /// Orthogonal factor Q (m-by-n), assembled by replaying the stored
    /// reflections against an identity in reverse column order
    pub fn q(&self) -> Matrix {
        let (m, n) = (self.m, self.n);
        let mut q = vec![0.0; m * n];
        for k in (0..n).rev() {
            for i in 0..m {
                q[i * n + k] = 0.0;
            }
            q[k * n + k] = 1.0;
            for j in k..n {
                if self.qr[k * n + k] != 0.0 {
                    let mut s = 0.0;
                    for i in k..m {
                        s += self.qr[i * n + k] * q[i * n + j];
                    }
                    s = -s / self.qr[k * n + k];
                    for i in k..m {
                        q[i * n + j] += s * self.qr[i * n + k];
                    }
                }
            }
        }
        let mut out = Matrix::zeros(m, n);
        out.as_mut_slice().copy_from_slice(&q);
        out
    }

    /// Least-squares solve: the `X` minimizing `||A @ X - B||`.
    ///
    /// Applies `Q^T` to B via the stored reflectors, back-substitutes
    /// against R, and returns the top `cols` rows. Fails with
    /// [`Error::DimensionMismatch`] if `B`'s row count disagrees with the
    /// input's.
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        let (m, n) = (self.m, self.n);
        if b.rows() != m {
            return Err(Error::dimension_mismatch((m, b.cols()), (b.rows(), b.cols())));
        }
        let nx = b.cols();
        let mut x = b.as_slice().to_vec();

        // Y = Q^T @ B, reflector by reflector
        for k in 0..n {
            for j in 0..nx {
                let mut s = 0.0;
                for i in k..m {
                    s += self.qr[i * n + k] * x[i * nx + j];
                }
                s = -s / self.qr[k * n + k];
                for i in k..m {
                    x[i * nx + j] += s * self.qr[i * n + k];
                }
            }
        }

        // Back substitution: R @ X = Y
        for k in (0..n).rev() {
            for j in 0..nx {
                x[k * nx + j] /= self.rdiag[k];
            }
            for i in 0..k {
                for j in 0..nx {
                    x[i * nx + j] -= x[k * nx + j] * self.qr[i * n + k];
                }
            }
        }

        let mut out = Matrix::zeros(n, nx);
        for i in 0..n {
            for j in 0..nx {
                out.set(i, j, x[i * nx + j]);
            }
        }
        Ok(out)
    }
}
