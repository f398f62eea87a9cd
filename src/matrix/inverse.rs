//! Matrix inverse via Gauss-Jordan elimination
//!
//! Full (row+column) pivoting by default: each step selects the largest
//! remaining entry across all still-available pivot rows and columns.
//! Off-diagonal pivot selections are not applied as physical swaps; they are
//! recorded in two index permutation arrays and resolved by a single O(n^2)
//! gather once elimination finishes.

use log::trace;

#[cfg(feature = "rayon")]
use super::ops::PARALLEL_THRESHOLD;
use super::Matrix;
use crate::error::{Error, Result};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Minimum pivot magnitude before elimination fails with [`Error::Singular`]
pub const MIN_PIVOT: f64 = 1e-20;

/// Pivot selection strategy for [`Matrix::inverse_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pivoting {
    /// Search all still-available rows and columns for the largest entry
    #[default]
    Full,
    /// Pivot on the diagonal only.
    ///
    /// Trades accuracy for speed: fails immediately on any diagonal pivot
    /// smaller than [`MIN_PIVOT`] rather than searching for an alternative.
    DiagonalOnly,
}

impl Matrix {
    /// Matrix inverse with full pivoting.
    ///
    /// Fails with [`Error::NotSquare`] for rectangular input and
    /// [`Error::Singular`] when no pivot of magnitude at least
    /// [`MIN_PIVOT`] remains.
    pub fn inverse(&self) -> Result<Matrix> {
        self.inverse_with(Pivoting::Full)
    }

    /// Matrix inverse with an explicit pivot selection strategy
    pub fn inverse_with(&self, pivoting: Pivoting) -> Result<Matrix> {
        let n = self.require_square()?;
        let mut w = self.as_slice().to_vec();

        // Logical row i lives at physical row row_perm[i]; off-diagonal
        // pivot selection swaps two entries here instead of 2n elements.
        let mut row_perm: Vec<usize> = (0..n).collect();
        let mut used = vec![false; n];
        let mut pivot_rows = Vec::with_capacity(n);
        let mut pivot_cols = Vec::with_capacity(n);

        for step in 0..n {
            let (irow, icol, big) = match pivoting {
                Pivoting::Full => select_pivot(&w, &row_perm, &used, n),
                Pivoting::DiagonalOnly => {
                    let v = w[row_perm[step] * n + step].abs();
                    (step, step, v)
                }
            };
            if big < MIN_PIVOT {
                return Err(Error::Singular { pivot: big });
            }

            used[icol] = true;
            if irow != icol {
                trace!("inverse: off-diagonal pivot ({irow}, {icol}) at step {step}");
                row_perm.swap(irow, icol);
            }
            pivot_rows.push(irow);
            pivot_cols.push(icol);

            let prow = row_perm[icol];
            let pivinv = 1.0 / w[prow * n + icol];

            // Pivot row sweep: the reciprocal lands where the pivot was, so
            // the identity column is built up in place.
            w[prow * n + icol] = 1.0;
            for j in 0..n {
                w[prow * n + j] *= pivinv;
            }

            // Elimination sweep: every non-pivot row is updated independently
            // against the immutable pivot row.
            let pivot_row: Vec<f64> = w[prow * n..(prow + 1) * n].to_vec();

            #[cfg(feature = "rayon")]
            if n * n >= PARALLEL_THRESHOLD {
                w.par_chunks_mut(n).enumerate().for_each(|(r, row)| {
                    if r != prow {
                        eliminate_row(row, &pivot_row, icol);
                    }
                });
                continue;
            }

            for r in 0..n {
                if r != prow {
                    eliminate_row(&mut w[r * n..(r + 1) * n], &pivot_row, icol);
                }
            }
        }

        // Resolve the deferred permutations: replay the column transpositions
        // in reverse onto an index map, then gather rows and columns at once.
        let mut col_map: Vec<usize> = (0..n).collect();
        for step in (0..n).rev() {
            if pivot_rows[step] != pivot_cols[step] {
                col_map.swap(pivot_rows[step], pivot_cols[step]);
            }
        }

        let mut out = Matrix::zeros(n, n);
        for i in 0..n {
            let src = &w[row_perm[i] * n..(row_perm[i] + 1) * n];
            let dst = &mut out.data[i * n..(i + 1) * n];
            for (j, out_ij) in dst.iter_mut().enumerate() {
                *out_ij = src[col_map[j]];
            }
        }
        Ok(out)
    }
}

/// Largest-magnitude entry over rows and columns not yet used as pivots
fn select_pivot(w: &[f64], row_perm: &[usize], used: &[bool], n: usize) -> (usize, usize, f64) {
    let mut big = 0.0;
    let mut irow = 0;
    let mut icol = 0;
    for i in 0..n {
        if used[i] {
            continue;
        }
        let row = &w[row_perm[i] * n..(row_perm[i] + 1) * n];
        for j in 0..n {
            if used[j] {
                continue;
            }
            let v = row[j].abs();
            if v >= big {
                big = v;
                irow = i;
                icol = j;
            }
        }
    }
    (irow, icol, big)
}

/// Subtract `row[icol]` times the scaled pivot row; the pivot column entry
/// becomes `-factor * pivinv`, continuing the in-place identity build-up.
#[inline]
fn eliminate_row(row: &mut [f64], pivot_row: &[f64], icol: usize) {
    let factor = row[icol];
    row[icol] = 0.0;
    for (x, &p) in row.iter_mut().zip(pivot_row) {
        *x -= factor * p;
    }
}
