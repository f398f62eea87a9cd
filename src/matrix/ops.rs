//! Matrix arithmetic kernels
//!
//! Binary operations validate conformable dimensions and fail with
//! [`Error::DimensionMismatch`] otherwise. Large operations partition the
//! row range into contiguous chunks on the rayon thread pool and join
//! before returning; each row is written by exactly one worker. The serial
//! fallback computes identical results.

use super::Matrix;
use crate::error::{Error, Result};
use crate::vector::Vector;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Parallelization threshold: skip rayon for small matrices (overhead > benefit)
#[cfg(feature = "rayon")]
pub(crate) const PARALLEL_THRESHOLD: usize = 4096;

impl Matrix {
    /// Element-wise sum: `self + other`
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.require_same_shape(other)?;
        let mut out = Matrix::zeros(self.rows, self.cols);
        binary_rows(
            &self.data,
            &other.data,
            &mut out.data,
            self.cols,
            |a, b| a + b,
        );
        Ok(out)
    }

    /// Element-wise difference: `self - other`
    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        self.require_same_shape(other)?;
        let mut out = Matrix::zeros(self.rows, self.cols);
        binary_rows(
            &self.data,
            &other.data,
            &mut out.data,
            self.cols,
            |a, b| a - b,
        );
        Ok(out)
    }

    /// Matrix product: `self @ other`
    ///
    /// Fails with [`Error::DimensionMismatch`] unless
    /// `self.cols == other.rows`.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::dimension_mismatch(
                (self.cols, other.cols),
                (other.rows, other.cols),
            ));
        }
        let (m, k, n) = (self.rows, self.cols, other.cols);
        let mut out = Matrix::zeros(m, n);

        #[cfg(feature = "rayon")]
        if m * n >= PARALLEL_THRESHOLD {
            out.data
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, out_row)| {
                    matmul_row(&self.data, &other.data, out_row, i, k, n);
                });
            return Ok(out);
        }

        for i in 0..m {
            let out_row = &mut out.data[i * n..(i + 1) * n];
            matmul_row(&self.data, &other.data, out_row, i, k, n);
        }
        Ok(out)
    }

    /// Matrix-vector product: `self @ v`
    ///
    /// Fails with [`Error::DimensionMismatch`] unless `self.cols == v.len()`.
    pub fn mul_vec(&self, v: &Vector) -> Result<Vector> {
        if self.cols != v.len() {
            return Err(Error::DimensionMismatch {
                expected: (self.cols, 1),
                got: (v.len(), 1),
            });
        }
        let mut out = vec![0.0; self.rows];
        let vs = v.as_slice();
        for (i, out_i) in out.iter_mut().enumerate() {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            *out_i = row.iter().zip(vs).map(|(a, x)| a * x).sum();
        }
        Ok(Vector::from_vec(out))
    }

    /// Scalar product: every element multiplied by `s`
    pub fn scale(&self, s: f64) -> Matrix {
        let mut out = self.clone();
        out.scale_in_place(s);
        out
    }

    /// Multiply every element by `s` in place
    pub fn scale_in_place(&mut self, s: f64) {
        #[cfg(feature = "rayon")]
        if self.data.len() >= PARALLEL_THRESHOLD {
            self.data
                .par_chunks_mut(self.cols)
                .for_each(|row| row.iter_mut().for_each(|x| *x *= s));
            return;
        }

        self.data.iter_mut().for_each(|x| *x *= s);
    }

    /// Transposed copy of the matrix
    pub fn transpose(&self) -> Matrix {
        let (m, n) = (self.rows, self.cols);
        let mut out = Matrix::zeros(n, m);

        #[cfg(feature = "rayon")]
        if m * n >= PARALLEL_THRESHOLD {
            out.data
                .par_chunks_mut(m)
                .enumerate()
                .for_each(|(j, out_row)| {
                    for (i, out_ij) in out_row.iter_mut().enumerate() {
                        *out_ij = self.data[i * n + j];
                    }
                });
            return out;
        }

        for j in 0..n {
            for i in 0..m {
                out.data[j * m + i] = self.data[i * n + j];
            }
        }
        out
    }

    /// Add `s` to every diagonal element in place.
    ///
    /// Fails with [`Error::NotSquare`] for rectangular input.
    pub fn add_scalar_to_diagonal(&mut self, s: f64) -> Result<()> {
        let n = self.require_square()?;
        for i in 0..n {
            self.data[i * n + i] += s;
        }
        Ok(())
    }

    /// Sum of diagonal elements
    pub fn trace(&self) -> f64 {
        let k = self.rows.min(self.cols);
        (0..k).map(|i| self.data[i * self.cols + i]).sum()
    }

    /// Copy of the main diagonal
    pub fn diagonal(&self) -> Vector {
        let k = self.rows.min(self.cols);
        Vector::from_vec((0..k).map(|i| self.data[i * self.cols + i]).collect())
    }

    /// Frobenius norm: sqrt of the sum of squared elements
    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Determinant via elimination with partial pivoting.
    ///
    /// det = (-1)^swaps * product of pivots. Fails with [`Error::NotSquare`]
    /// for rectangular input; a singular matrix yields 0.
    pub fn determinant(&self) -> Result<f64> {
        let n = self.require_square()?;
        let mut work = self.data.clone();
        let mut det = 1.0;

        for col in 0..n {
            // Find pivot: max absolute value in column col, rows col..n
            let mut pivot_row = col;
            let mut max_val = work[col * n + col].abs();
            for row in (col + 1)..n {
                let val = work[row * n + col].abs();
                if val > max_val {
                    max_val = val;
                    pivot_row = row;
                }
            }

            if max_val == 0.0 {
                return Ok(0.0);
            }

            if pivot_row != col {
                for j in 0..n {
                    work.swap(col * n + j, pivot_row * n + j);
                }
                det = -det;
            }

            let pivot = work[col * n + col];
            det *= pivot;

            for row in (col + 1)..n {
                let multiplier = work[row * n + col] / pivot;
                for j in (col + 1)..n {
                    work[row * n + j] -= multiplier * work[col * n + j];
                }
            }
        }

        Ok(det)
    }
}

/// Apply a binary op row by row, in parallel above the threshold
fn binary_rows<F>(a: &[f64], b: &[f64], out: &mut [f64], cols: usize, op: F)
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    #[cfg(feature = "rayon")]
    if out.len() >= PARALLEL_THRESHOLD {
        out.par_chunks_mut(cols)
            .zip(a.par_chunks(cols).zip(b.par_chunks(cols)))
            .for_each(|(out_row, (a_row, b_row))| {
                for ((o, &x), &y) in out_row.iter_mut().zip(a_row).zip(b_row) {
                    *o = op(x, y);
                }
            });
        return;
    }

    for (out_row, (a_row, b_row)) in out.chunks_mut(cols).zip(a.chunks(cols).zip(b.chunks(cols))) {
        for ((o, &x), &y) in out_row.iter_mut().zip(a_row).zip(b_row) {
            *o = op(x, y);
        }
    }
}

/// One output row of C = A @ B, ikj order for cache locality on B
#[inline]
fn matmul_row(a: &[f64], b: &[f64], out_row: &mut [f64], i: usize, k: usize, n: usize) {
    for kk in 0..k {
        let a_val = a[i * k + kk];
        let b_row = &b[kk * n..(kk + 1) * n];
        for (o, &b_val) in out_row.iter_mut().zip(b_row) {
            *o += a_val * b_val;
        }
    }
}

impl std::ops::Add for &Matrix {
    type Output = Matrix;

    /// # Panics
    /// Panics on dimension mismatch; use [`Matrix::add`] for a checked result.
    fn add(self, other: &Matrix) -> Matrix {
        Matrix::add(self, other).expect("matrix addition dimension mismatch")
    }
}

impl std::ops::Sub for &Matrix {
    type Output = Matrix;

    /// # Panics
    /// Panics on dimension mismatch; use [`Matrix::sub`] for a checked result.
    fn sub(self, other: &Matrix) -> Matrix {
        Matrix::sub(self, other).expect("matrix subtraction dimension mismatch")
    }
}

impl std::ops::Mul for &Matrix {
    type Output = Matrix;

    /// # Panics
    /// Panics on dimension mismatch; use [`Matrix::matmul`] for a checked result.
    fn mul(self, other: &Matrix) -> Matrix {
        self.matmul(other).expect("matrix product dimension mismatch")
    }
}

impl std::ops::Mul<&Vector> for &Matrix {
    type Output = Vector;

    /// # Panics
    /// Panics on dimension mismatch; use [`Matrix::mul_vec`] for a checked result.
    fn mul(self, v: &Vector) -> Vector {
        self.mul_vec(v).expect("matrix-vector dimension mismatch")
    }
}

impl std::ops::Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, s: f64) -> Matrix {
        self.scale(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sub() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[&[5.0, 6.0], &[7.0, 8.0]]).unwrap();
        let c = a.add(&b).unwrap();
        assert_eq!(c.get(0, 0), 6.0);
        assert_eq!(c.get(1, 1), 12.0);
        let d = c.sub(&b).unwrap();
        assert_eq!(d, a);
    }

    #[test]
    fn test_add_shape_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(3, 2);
        assert!(matches!(a.add(&b), Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_matmul_2x2() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[&[5.0, 6.0], &[7.0, 8.0]]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.get(0, 0), 19.0); // 1*5 + 2*7
        assert_eq!(c.get(0, 1), 22.0);
        assert_eq!(c.get(1, 0), 43.0);
        assert_eq!(c.get(1, 1), 50.0);
    }

    #[test]
    fn test_matmul_rectangular() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[&[1.0], &[2.0], &[3.0]]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.rows(), 2);
        assert_eq!(c.cols(), 1);
        assert_eq!(c.get(0, 0), 14.0);
        assert_eq!(c.get(1, 0), 32.0);
    }

    #[test]
    fn test_mul_vec() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        let v = Vector::from_slice(&[1.0, 1.0]);
        let out = a.mul_vec(&v).unwrap();
        assert_eq!(out.as_slice(), &[3.0, 7.0]);
    }

    #[test]
    fn test_transpose() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        let t = a.transpose();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        assert_eq!(t.get(0, 1), 4.0);
        assert_eq!(t.get(2, 1), 6.0);
    }

    #[test]
    fn test_add_scalar_to_diagonal() {
        let mut a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        a.add_scalar_to_diagonal(10.0).unwrap();
        assert_eq!(a.get(0, 0), 11.0);
        assert_eq!(a.get(1, 1), 14.0);
        assert_eq!(a.get(0, 1), 2.0);

        let mut r = Matrix::zeros(2, 3);
        assert!(matches!(
            r.add_scalar_to_diagonal(1.0),
            Err(Error::NotSquare { .. })
        ));
    }

    #[test]
    fn test_trace() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        assert_eq!(a.trace(), 5.0);
    }

    #[test]
    fn test_determinant() {
        // det = 4*3 - 3*6 = -6
        let a = Matrix::from_rows(&[&[4.0, 3.0], &[6.0, 3.0]]).unwrap();
        assert!((a.determinant().unwrap() - (-6.0)).abs() < 1e-12);

        // Needs a row swap: det([[0,1],[1,0]]) = -1
        let p = Matrix::from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]).unwrap();
        assert!((p.determinant().unwrap() - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_operators() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        let b = Matrix::identity(2);
        assert_eq!(&a * &b, a);
        assert_eq!((&a + &b).get(0, 0), 2.0);
        assert_eq!((&a - &b).get(1, 1), 3.0);
        assert_eq!((&a * 2.0).get(1, 0), 6.0);
    }
}
