//! Singular value decomposition
//!
//! Golub-Kahan bidiagonalization followed by implicit-shift QR iteration on
//! the bidiagonal form.

use log::trace;

use super::{hypot, EPS};
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Iteration guard per singular value before reporting
/// [`Error::ConvergenceFailure`]
pub const DEFAULT_MAX_ITERATIONS: usize = 75;

/// Magnitudes below this are negligible regardless of scale (2^-966)
const TINY: f64 = 1.6033346880071782e-291;

/// Options for [`SvdDecomposition::with_options`]
#[derive(Debug, Clone, Copy)]
pub struct SvdOptions {
    /// Materialize the left singular vectors U
    pub compute_u: bool,
    /// Materialize the right singular vectors V
    pub compute_v: bool,
    /// Iteration guard per singular value
    pub max_iterations: usize,
}

impl Default for SvdOptions {
    fn default() -> Self {
        Self {
            compute_u: true,
            compute_v: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Singular value decomposition: `A = U @ S @ V^T`.
///
/// For an input of `rows x cols` with `k = min(rows, cols)`: U is
/// `rows x k`, S is the `k x k` diagonal of singular values (non-negative,
/// descending), and V is `cols x k`. Either factor can be omitted via
/// [`SvdOptions`], which skips the corresponding accumulation sweeps and
/// saves their memory.
///
/// Phase 1 reduces the matrix to upper-bidiagonal form with alternating
/// column and row Householder reflections; phase 2 diagonalizes the
/// bidiagonal form with implicit-shift QR sweeps, deflating one singular
/// value at a time. Wide input (`rows < cols`) is transposed internally and
/// the factors swapped on the way out.
pub struct SvdDecomposition {
    u: Option<Matrix>,
    v: Option<Matrix>,
    s: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl SvdDecomposition {
    /// Decompose, materializing both U and V
    pub fn new(a: &Matrix) -> Result<Self> {
        Self::with_options(a, SvdOptions::default())
    }

    /// Decompose with explicit factor selection and iteration guard
    pub fn with_options(a: &Matrix, options: SvdOptions) -> Result<Self> {
        let (rows, cols) = (a.rows(), a.cols());

        if rows >= cols {
            let (u, s, v) = golub_kahan(
                a.as_slice().to_vec(),
                rows,
                cols,
                options.compute_u,
                options.compute_v,
                options.max_iterations,
            )?;
            Ok(Self {
                u: u.map(|buf| buffer_to_matrix(buf, rows, cols)),
                v: v.map(|buf| buffer_to_matrix(buf, cols, cols)),
                s,
                rows,
                cols,
            })
        } else {
            // A = (U' S V'^T)^T of the transpose, so U and V swap roles
            let at = a.transpose();
            let (u, s, v) = golub_kahan(
                at.into_vec(),
                cols,
                rows,
                options.compute_v,
                options.compute_u,
                options.max_iterations,
            )?;
            Ok(Self {
                u: v.map(|buf| buffer_to_matrix(buf, rows, rows)),
                v: u.map(|buf| buffer_to_matrix(buf, cols, rows)),
                s,
                rows,
                cols,
            })
        }
    }

    /// Left singular vectors (`rows x k`), if materialized
    pub fn u(&self) -> Option<&Matrix> {
        self.u.as_ref()
    }

    /// Right singular vectors (`cols x k`), if materialized
    pub fn v(&self) -> Option<&Matrix> {
        self.v.as_ref()
    }

    /// Singular values in descending order
    pub fn singular_values(&self) -> &[f64] {
        &self.s
    }

    /// Largest singular value
    pub fn max_singular_value(&self) -> f64 {
        self.s.first().copied().unwrap_or(0.0)
    }

    /// Condition number: ratio of the largest to the smallest singular value
    pub fn cond(&self) -> f64 {
        match (self.s.first(), self.s.last()) {
            (Some(&max), Some(&min)) => max / min,
            _ => f64::INFINITY,
        }
    }

    /// The `k x k` diagonal matrix of singular values
    pub fn singular_value_matrix(&self) -> Matrix {
        let k = self.s.len();
        let mut out = Matrix::zeros(k, k);
        for (i, &sv) in self.s.iter().enumerate() {
            out.set(i, i, sv);
        }
        out
    }

    /// Effective rank: singular values exceeding
    /// `max(rows, cols) * sigma_max * 2^-52`
    pub fn rank(&self) -> usize {
        let tol = self.rows.max(self.cols) as f64 * self.max_singular_value() * EPS;
        self.s.iter().filter(|&&sv| sv > tol).count()
    }
}

fn buffer_to_matrix(buf: Vec<f64>, rows: usize, cols: usize) -> Matrix {
    let mut out = Matrix::zeros(rows, cols);
    out.as_mut_slice().copy_from_slice(&buf);
    out
}

/// Compute the SVD of an `m x n` matrix with `m >= n`.
///
/// Returns `(U, s, V)` as flat buffers: U is `m x n`, V is `n x n`, s has
/// `n` entries in descending order.
fn golub_kahan(
    mut a: Vec<f64>,
    m: usize,
    n: usize,
    wantu: bool,
    wantv: bool,
    max_iterations: usize,
) -> Result<(Option<Vec<f64>>, Vec<f64>, Option<Vec<f64>>)> {
    let nu = n;
    let mut s = vec![0.0; n];
    let mut e = vec![0.0; n];
    let mut u = if wantu { vec![0.0; m * nu] } else { Vec::new() };
    let mut v = if wantv { vec![0.0; n * n] } else { Vec::new() };
    let mut work = vec![0.0; m];

    // Phase 1: bidiagonalize. Column Householders zero below the diagonal,
    // row Householders zero right of the superdiagonal; the provisional
    // singular values land in s and the superdiagonal in e.
    let nct = (m - 1).min(n);
    let nrt = n.saturating_sub(2).min(m);

    for k in 0..nct.max(nrt) {
        if k < nct {
            s[k] = 0.0;
            for i in k..m {
                s[k] = hypot(s[k], a[i * n + k]);
            }
            if s[k] != 0.0 {
                if a[k * n + k] < 0.0 {
                    s[k] = -s[k];
                }
                for i in k..m {
                    a[i * n + k] /= s[k];
                }
                a[k * n + k] += 1.0;
            }
            s[k] = -s[k];
        }

        for j in (k + 1)..n {
            if k < nct && s[k] != 0.0 {
                let mut t = 0.0;
                for i in k..m {
                    t += a[i * n + k] * a[i * n + j];
                }
                t = -t / a[k * n + k];
                for i in k..m {
                    a[i * n + j] += t * a[i * n + k];
                }
            }
            e[j] = a[k * n + j];
        }

        if wantu && k < nct {
            for i in k..m {
                u[i * nu + k] = a[i * n + k];
            }
        }

        if k < nrt {
            e[k] = 0.0;
            for i in (k + 1)..n {
                e[k] = hypot(e[k], e[i]);
            }
            if e[k] != 0.0 {
                if e[k + 1] < 0.0 {
                    e[k] = -e[k];
                }
                let ek = e[k];
                for item in e[(k + 1)..n].iter_mut() {
                    *item /= ek;
                }
                e[k + 1] += 1.0;
            }
            e[k] = -e[k];

            if k + 1 < m && e[k] != 0.0 {
                for item in work[(k + 1)..m].iter_mut() {
                    *item = 0.0;
                }
                for j in (k + 1)..n {
                    for i in (k + 1)..m {
                        work[i] += e[j] * a[i * n + j];
                    }
                }
                for j in (k + 1)..n {
                    let t = -e[j] / e[k + 1];
                    for i in (k + 1)..m {
                        a[i * n + j] += t * work[i];
                    }
                }
            }

            if wantv {
                for i in (k + 1)..n {
                    v[i * n + k] = e[i];
                }
            }
        }
    }

    // Set up the final bidiagonal of order p
    let p = n.min(m + 1);
    if nct < n {
        s[nct] = a[nct * n + nct];
    }
    if m < p {
        s[p - 1] = 0.0;
    }
    if nrt + 1 < p {
        e[nrt] = a[nrt * n + (p - 1)];
    }
    e[p - 1] = 0.0;

    // Generate U by back-accumulating the column reflections
    if wantu {
        for j in nct..nu {
            for i in 0..m {
                u[i * nu + j] = 0.0;
            }
            u[j * nu + j] = 1.0;
        }
        for k in (0..nct).rev() {
            if s[k] != 0.0 {
                for j in (k + 1)..nu {
                    let mut t = 0.0;
                    for i in k..m {
                        t += u[i * nu + k] * u[i * nu + j];
                    }
                    t = -t / u[k * nu + k];
                    for i in k..m {
                        u[i * nu + j] += t * u[i * nu + k];
                    }
                }
                for i in k..m {
                    u[i * nu + k] = -u[i * nu + k];
                }
                u[k * nu + k] += 1.0;
                for i in 0..k.saturating_sub(1) {
                    u[i * nu + k] = 0.0;
                }
            } else {
                for i in 0..m {
                    u[i * nu + k] = 0.0;
                }
                u[k * nu + k] = 1.0;
            }
        }
    }

    // Generate V by back-accumulating the row reflections
    if wantv {
        for k in (0..n).rev() {
            if k < nrt && e[k] != 0.0 {
                for j in (k + 1)..nu {
                    let mut t = 0.0;
                    for i in (k + 1)..n {
                        t += v[i * n + k] * v[i * n + j];
                    }
                    t = -t / v[(k + 1) * n + k];
                    for i in (k + 1)..n {
                        v[i * n + j] += t * v[i * n + k];
                    }
                }
            }
            for i in 0..n {
                v[i * n + k] = 0.0;
            }
            v[k * n + k] = 1.0;
        }
    }

    // Phase 2: implicit-shift QR on the bidiagonal form
    let mut p = p;
    let pp_final = p.saturating_sub(1);
    let mut iter = 0usize;

    while p > 0 {
        if iter > max_iterations {
            return Err(Error::ConvergenceFailure {
                op: "svd qr iteration",
                iterations: iter,
            });
        }

        // Classify the trailing sub-block. kase = 1: s[p-1] negligible;
        // kase = 2: a split at negligible s[k]; kase = 3: full QR step;
        // kase = 4: e[p-2] negligible, s[p-1] converged.
        let mut k = p as isize - 2;
        while k >= 0 {
            let ku = k as usize;
            if e[ku].abs() <= TINY + EPS * (s[ku].abs() + s[ku + 1].abs()) {
                e[ku] = 0.0;
                break;
            }
            k -= 1;
        }

        let kase;
        if k == p as isize - 2 {
            kase = 4;
        } else {
            let mut ks = p as isize - 1;
            while ks > k {
                let ksu = ks as usize;
                let mut t = 0.0;
                if ks != p as isize {
                    t += e[ksu].abs();
                }
                if ks != k + 1 {
                    t += e[ksu - 1].abs();
                }
                if s[ksu].abs() <= TINY + EPS * t {
                    s[ksu] = 0.0;
                    break;
                }
                ks -= 1;
            }
            if ks == k {
                kase = 3;
            } else if ks == p as isize - 1 {
                kase = 1;
            } else {
                kase = 2;
                k = ks;
            }
        }
        let mut k = (k + 1) as usize;

        match kase {
            // Deflate negligible s[p-1]: chase e[p-2] up into V
            1 => {
                let mut f = e[p - 2];
                e[p - 2] = 0.0;
                for j in (k..=(p - 2)).rev() {
                    let t = hypot(s[j], f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    if j != k {
                        f = -sn * e[j - 1];
                        e[j - 1] *= cs;
                    }
                    if wantv {
                        rotate_columns(&mut v, n, n, j, p - 1, cs, sn);
                    }
                }
            }

            // Split at negligible s[k-1]: chase into U
            2 => {
                let mut f = e[k - 1];
                e[k - 1] = 0.0;
                for j in k..p {
                    let t = hypot(s[j], f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    f = -sn * e[j];
                    e[j] *= cs;
                    if wantu {
                        rotate_columns(&mut u, m, nu, j, k - 1, cs, sn);
                    }
                }
            }

            // One implicit QR sweep with a Wilkinson-style shift from the
            // trailing 2x2 block
            3 => {
                let scale = s[p - 1]
                    .abs()
                    .max(s[p - 2].abs())
                    .max(e[p - 2].abs())
                    .max(s[k].abs())
                    .max(e[k].abs());
                let sp = s[p - 1] / scale;
                let spm1 = s[p - 2] / scale;
                let epm1 = e[p - 2] / scale;
                let sk = s[k] / scale;
                let ek = e[k] / scale;
                let b = ((spm1 + sp) * (spm1 - sp) + epm1 * epm1) / 2.0;
                let c = (sp * epm1) * (sp * epm1);
                let mut shift = 0.0;
                if b != 0.0 || c != 0.0 {
                    shift = (b * b + c).sqrt();
                    if b < 0.0 {
                        shift = -shift;
                    }
                    shift = c / (b + shift);
                }
                let mut f = (sk + sp) * (sk - sp) + shift;
                let mut g = sk * ek;

                // Chase the bulge down through both factors
                for j in k..(p - 1) {
                    let mut t = hypot(f, g);
                    let mut cs = f / t;
                    let mut sn = g / t;
                    if j != k {
                        e[j - 1] = t;
                    }
                    f = cs * s[j] + sn * e[j];
                    e[j] = cs * e[j] - sn * s[j];
                    g = sn * s[j + 1];
                    s[j + 1] *= cs;
                    if wantv {
                        rotate_columns(&mut v, n, n, j, j + 1, cs, sn);
                    }

                    t = hypot(f, g);
                    cs = f / t;
                    sn = g / t;
                    s[j] = t;
                    f = cs * e[j] + sn * s[j + 1];
                    s[j + 1] = -sn * e[j] + cs * s[j + 1];
                    g = sn * e[j + 1];
                    e[j + 1] *= cs;
                    if wantu && j < m - 1 {
                        rotate_columns(&mut u, m, nu, j, j + 1, cs, sn);
                    }
                }
                e[p - 2] = f;
                iter += 1;
            }

            // Converged: fix the sign, order it among the already-converged
            // values, and shrink the active block
            _ => {
                if s[k] <= 0.0 {
                    s[k] = if s[k] < 0.0 { -s[k] } else { 0.0 };
                    if wantv {
                        for i in 0..n {
                            v[i * n + k] = -v[i * n + k];
                        }
                    }
                }
                while k < pp_final {
                    if s[k] >= s[k + 1] {
                        break;
                    }
                    s.swap(k, k + 1);
                    if wantv && k < n - 1 {
                        swap_columns(&mut v, n, n, k, k + 1);
                    }
                    if wantu && k < m - 1 {
                        swap_columns(&mut u, m, nu, k, k + 1);
                    }
                    k += 1;
                }
                trace!("svd: singular value {} converged after {} iterations", p - 1, iter);
                iter = 0;
                p -= 1;
            }
        }
    }

    Ok((
        if wantu { Some(u) } else { None },
        s,
        if wantv { Some(v) } else { None },
    ))
}

/// Apply a Givens rotation to columns `j1`, `j2` of a row-major buffer
#[inline]
fn rotate_columns(buf: &mut [f64], rows: usize, cols: usize, j1: usize, j2: usize, cs: f64, sn: f64) {
    for i in 0..rows {
        let t = cs * buf[i * cols + j1] + sn * buf[i * cols + j2];
        buf[i * cols + j2] = -sn * buf[i * cols + j1] + cs * buf[i * cols + j2];
        buf[i * cols + j1] = t;
    }
}

/// Swap columns `j1`, `j2` of a row-major buffer
#[inline]
fn swap_columns(buf: &mut [f64], rows: usize, cols: usize, j1: usize, j2: usize) {
    for i in 0..rows {
        buf.swap(i * cols + j1, i * cols + j2);
    }
}
