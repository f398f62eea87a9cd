//! Eigenvalue decomposition
//!
//! Dispatches once at construction on an exhaustive element-wise symmetry
//! test: symmetric input takes Householder tridiagonalization followed by
//! implicit-shift QL; general input takes Hessenberg reduction followed by
//! the implicit double-shift QR algorithm with back-substitution
//! eigenvector recovery.

use super::{eig_general, eig_symmetric};
use crate::error::Result;
use crate::matrix::Matrix;

/// Iteration guard for the symmetric QL sweep, per eigenvalue
pub(super) const MAX_QL_ITERATIONS: usize = 30;

/// Iteration guard for the general QR sweep, per deflation block
pub(super) const MAX_QR_ITERATIONS: usize = 50;

/// A single eigenvalue of a real matrix.
///
/// Complex eigenvalues of a real matrix come in conjugate pairs spanning
/// two adjacent indices: the positive imaginary part is stored at the lower
/// index and negated at the upper index, matching the corresponding columns
/// of the eigenvector matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eigenvalue {
    /// A real eigenvalue
    Real(f64),
    /// One half of a complex conjugate pair
    Complex {
        /// Real component
        re: f64,
        /// Imaginary component
        im: f64,
    },
}

/// Eigenvalue decomposition: `A @ V = V @ D`.
///
/// For symmetric input, D is diagonal with eigenvalues in ascending order
/// and V is orthonormal. For general input, eigenvalues appear in
/// algorithm-determined order, D is block diagonal (1x1 blocks for real
/// eigenvalues, 2x2 blocks for conjugate pairs), and the columns of V span
/// the corresponding invariant subspaces.
///
/// The algorithm path is chosen once at construction and never re-entered;
/// construction either fully completes or returns an error.
pub struct EigenDecomposition {
    v: Vec<f64>,
    d: Vec<f64>,
    e: Vec<f64>,
    n: usize,
    symmetric: bool,
}

impl EigenDecomposition {
    /// Decompose a square matrix.
    ///
    /// Fails with [`Error::NotSquare`](crate::Error::NotSquare) for
    /// rectangular input and
    /// [`Error::ConvergenceFailure`](crate::Error::ConvergenceFailure) if an
    /// iterative sweep exceeds its guard.
    pub fn new(a: &Matrix) -> Result<Self> {
        Self::with_max_iterations(a, None)
    }

    /// Decompose with an explicit iteration guard overriding the per-path
    /// defaults (30 for the symmetric QL sweep, 50 per deflation block for
    /// the general QR sweep)
    pub fn with_max_iterations(a: &Matrix, max_iterations: Option<usize>) -> Result<Self> {
        let n = a.require_square()?;
        let symmetric = a.is_symmetric();

        let mut d = vec![0.0; n];
        let mut e = vec![0.0; n];

        let v = if symmetric {
            let mut v = a.as_slice().to_vec();
            eig_symmetric::tridiagonalize(&mut v, &mut d, &mut e, n);
            eig_symmetric::ql_iterate(
                &mut v,
                &mut d,
                &mut e,
                n,
                max_iterations.unwrap_or(MAX_QL_ITERATIONS),
            )?;
            // e held the sub-diagonal during reduction; eigenvalues are real
            e.iter_mut().for_each(|x| *x = 0.0);
            v
        } else {
            let mut h = a.as_slice().to_vec();
            let mut v = vec![0.0; n * n];
            eig_general::hessenberg(&mut h, &mut v, n);
            eig_general::francis_qr(
                &mut h,
                &mut v,
                &mut d,
                &mut e,
                n,
                max_iterations.unwrap_or(MAX_QR_ITERATIONS),
            )?;
            v
        };

        Ok(Self {
            v,
            d,
            e,
            n,
            symmetric,
        })
    }

    /// Matrix order
    pub fn order(&self) -> usize {
        self.n
    }

    /// Whether the symmetric path was taken
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Eigenvector matrix; column `i` corresponds to eigenvalue `i`
    pub fn v(&self) -> Matrix {
        let mut out = Matrix::zeros(self.n, self.n);
        out.as_mut_slice().copy_from_slice(&self.v);
        out
    }

    /// Real parts of the eigenvalues, in stored order
    pub fn real_eigenvalues(&self) -> &[f64] {
        &self.d
    }

    /// Imaginary parts of the eigenvalues; all zero for a real spectrum
    pub fn imag_eigenvalues(&self) -> &[f64] {
        &self.e
    }

    /// Eigenvalues as a tagged list, indexed consistently with the columns
    /// of [`EigenDecomposition::v`]
    pub fn eigenvalues(&self) -> Vec<Eigenvalue> {
        self.d
            .iter()
            .zip(self.e.iter())
            .map(|(&re, &im)| {
                if im == 0.0 {
                    Eigenvalue::Real(re)
                } else {
                    Eigenvalue::Complex { re, im }
                }
            })
            .collect()
    }

    /// Largest absolute real eigenvalue component
    pub fn max_abs_real_eigenvalue(&self) -> f64 {
        self.d.iter().fold(0.0, |acc: f64, &x| acc.max(x.abs()))
    }

    /// Block diagonal eigenvalue matrix D: 1x1 blocks for real eigenvalues;
    /// for a conjugate pair, the imaginary magnitude sits above the diagonal
    /// at the lower index and below it (negated) at the upper index
    pub fn d(&self) -> Matrix {
        let n = self.n;
        let mut out = Matrix::zeros(n, n);
        for i in 0..n {
            out.set(i, i, self.d[i]);
            if self.e[i] > 0.0 {
                out.set(i, i + 1, self.e[i]);
            } else if self.e[i] < 0.0 {
                out.set(i, i - 1, self.e[i]);
            }
        }
        out
    }
}
