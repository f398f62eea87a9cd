//! # linmat
//!
//! **Dense real-matrix numerical toolkit in pure Rust.**
//!
//! linmat provides the classical dense factorizations (eigendecomposition,
//! singular value decomposition, QR, and LU) together with the matrix/vector
//! arithmetic primitives they depend on.
//!
//! ## Why linmat?
//!
//! - **Pure Rust**: no LAPACK, no BLAS, no FFI, just a self-contained crate
//! - **Dense `f64` only**: row-major buffers of IEEE doubles, nothing generic
//!   to fight with
//! - **Fail fast**: conformability and rank violations surface as typed
//!   errors at the point of detection, never as partial results
//! - **Parallel arithmetic**: matrix arithmetic partitions rows across a
//!   thread pool; decompositions stay sequential where the math demands it
//!
//! ## Features
//!
//! - **Matrix/Vector**: add, subtract, multiply (matrix, vector, scalar),
//!   transpose, diagonal shift, full-pivot inverse with deferred permutation
//! - **LU**: in-place Doolittle factorization with forward/back substitution
//! - **QR**: Householder reflections with least-squares solve
//! - **SVD**: Golub-Kahan bidiagonalization + implicit-shift QR, optional
//!   U/V, descending singular values, condition number and rank
//! - **Eigen**: Householder tridiagonalization + implicit-shift QL for
//!   symmetric input; Hessenberg reduction + implicit double-shift QR with
//!   real/complex back-substitution for general input
//!
//! ## Quick Start
//!
//! ```
//! use linmat::prelude::*;
//!
//! let a = Matrix::from_rows(&[&[4.0, 1.0], &[2.0, 3.0]])?;
//!
//! let inv = a.inverse()?;
//! let eig = EigenDecomposition::new(&a)?;
//! let svd = SvdDecomposition::new(&a)?;
//!
//! assert!((eig.max_abs_real_eigenvalue() - 5.0).abs() < 1e-9);
//! assert_eq!(svd.rank(), 2);
//! assert_eq!(inv.rows(), 2);
//! # Ok::<(), linmat::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded row-partitioned arithmetic

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod linalg;
pub mod matrix;
pub mod vector;

pub use error::{Error, Result};
pub use linalg::{
    EigenDecomposition, Eigenvalue, LuDecomposition, QrDecomposition, SvdDecomposition,
    SvdOptions,
};
pub use matrix::{Matrix, Pivoting};
pub use vector::Vector;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::linalg::{
        hypot, EigenDecomposition, Eigenvalue, LuDecomposition, QrDecomposition,
        SvdDecomposition, SvdOptions,
    };
    pub use crate::matrix::{Matrix, Pivoting};
    pub use crate::vector::Vector;
}
