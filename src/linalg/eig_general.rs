//! General eigendecomposition kernels
//!
//! Householder reduction to upper Hessenberg form with back-accumulation of
//! the orthogonal transform, followed by the implicit double-shift QR
//! algorithm on the Hessenberg form. Eigenvectors are recovered by
//! back-substitution against the quasi-triangular Schur form and rotated
//! back to the original basis.

use log::{debug, trace};

use super::EPS;
use crate::error::{Error, Result};

/// Reduce to upper Hessenberg form, accumulating the orthogonal transform.
///
/// On entry `h` holds the matrix; on return `h` is upper Hessenberg and `v`
/// holds the accumulated transformation.
pub(super) fn hessenberg(h: &mut [f64], v: &mut [f64], n: usize) {
    let low = 0;
    let high = n - 1;
    let mut ort = vec![0.0; n];

    for m in (low + 1)..high {
        // Scale the column below the sub-diagonal
        let mut scale = 0.0;
        for i in m..=high {
            scale += h[i * n + m - 1].abs();
        }
        if scale != 0.0 {
            // Compute the Householder transformation
            let mut hsum = 0.0;
            for i in (m..=high).rev() {
                ort[i] = h[i * n + m - 1] / scale;
                hsum += ort[i] * ort[i];
            }
            let mut g = hsum.sqrt();
            if ort[m] > 0.0 {
                g = -g;
            }
            hsum -= ort[m] * g;
            ort[m] -= g;

            // Apply Householder similarity transformation:
            // H = (I - u*u'/h) * H * (I - u*u'/h)
            for j in m..n {
                let mut f = 0.0;
                for i in (m..=high).rev() {
                    f += ort[i] * h[i * n + j];
                }
                f /= hsum;
                for i in m..=high {
                    h[i * n + j] -= f * ort[i];
                }
            }
            for i in 0..=high {
                let mut f = 0.0;
                for j in (m..=high).rev() {
                    f += ort[j] * h[i * n + j];
                }
                f /= hsum;
                for j in m..=high {
                    h[i * n + j] -= f * ort[j];
                }
            }
            ort[m] *= scale;
            h[m * n + m - 1] = scale * g;
        }
    }

    // Accumulate transformations (ortran back-accumulation)
    for i in 0..n {
        for j in 0..n {
            v[i * n + j] = if i == j { 1.0 } else { 0.0 };
        }
    }
    for m in ((low + 1)..high).rev() {
        if h[m * n + m - 1] != 0.0 {
            for i in (m + 1)..=high {
                ort[i] = h[i * n + m - 1];
            }
            for j in m..=high {
                let mut g = 0.0;
                for i in m..=high {
                    g += ort[i] * v[i * n + j];
                }
                // Double division avoids possible underflow
                g = (g / ort[m]) / h[m * n + m - 1];
                for i in m..=high {
                    v[i * n + j] += g * ort[i];
                }
            }
        }
    }
}

/// Implicit double-shift QR on an upper Hessenberg matrix.
///
/// Deflates one or two eigenvalues at a time into `d` (real parts) and `e`
/// (imaginary parts), then recovers eigenvectors by back-substitution and
/// transforms them through the accumulated basis in `v`. Wilkinson's ad-hoc
/// exceptional shift fires after 10 iterations without deflation within a
/// block and a second ad-hoc shift after 30; counters reset on every
/// deflation.
#[allow(clippy::needless_range_loop)]
#[allow(unused_assignments)]
pub(super) fn francis_qr(
    h: &mut [f64],
    v: &mut [f64],
    d: &mut [f64],
    e: &mut [f64],
    nn: usize,
    max_iterations: usize,
) -> Result<()> {
    let n = nn;
    let low: usize = 0;
    let high: usize = nn - 1;
    let mut exshift = 0.0;
    let (mut p, mut q, mut r, mut s, mut z) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut t, mut w, mut x, mut y) = (0.0, 0.0, 0.0, 0.0);

    // Matrix norm over the Hessenberg band
    let mut norm = 0.0;
    for i in 0..nn {
        for j in i.saturating_sub(1)..nn {
            norm += h[i * n + j].abs();
        }
    }

    let mut en = nn as isize - 1;
    let mut iter = 0usize;

    while en >= low as isize {
        let enu = en as usize;

        // Look for a single small sub-diagonal element
        let mut l = enu;
        while l > low {
            s = h[(l - 1) * n + l - 1].abs() + h[l * n + l].abs();
            if s == 0.0 {
                s = norm;
            }
            if h[l * n + l - 1].abs() < EPS * s {
                break;
            }
            l -= 1;
        }

        if l == enu {
            // One root found
            h[enu * n + enu] += exshift;
            d[enu] = h[enu * n + enu];
            e[enu] = 0.0;
            en -= 1;
            iter = 0;
            trace!("francis qr: real eigenvalue deflated at {enu}");
        } else if l == enu - 1 {
            // Two roots found: the trailing 2x2 block yields a real or a
            // complex conjugate pair depending on its discriminant
            w = h[enu * n + enu - 1] * h[(enu - 1) * n + enu];
            p = (h[(enu - 1) * n + enu - 1] - h[enu * n + enu]) / 2.0;
            q = p * p + w;
            z = q.abs().sqrt();
            h[enu * n + enu] += exshift;
            h[(enu - 1) * n + enu - 1] += exshift;
            x = h[enu * n + enu];

            if q >= 0.0 {
                // Real pair: rotate the block into diagonal form
                z = if p >= 0.0 { p + z } else { p - z };
                d[enu - 1] = x + z;
                d[enu] = d[enu - 1];
                if z != 0.0 {
                    d[enu] = x - w / z;
                }
                e[enu - 1] = 0.0;
                e[enu] = 0.0;
                x = h[enu * n + enu - 1];
                s = x.abs() + z.abs();
                p = x / s;
                q = z / s;
                r = (p * p + q * q).sqrt();
                p /= r;
                q /= r;
                // Row modification
                for j in (enu - 1)..n {
                    z = h[(enu - 1) * n + j];
                    h[(enu - 1) * n + j] = q * z + p * h[enu * n + j];
                    h[enu * n + j] = q * h[enu * n + j] - p * z;
                }
                // Column modification
                for i in 0..=enu {
                    z = h[i * n + enu - 1];
                    h[i * n + enu - 1] = q * z + p * h[i * n + enu];
                    h[i * n + enu] = q * h[i * n + enu] - p * z;
                }
                // Accumulate transformations
                for i in low..=high {
                    z = v[i * n + enu - 1];
                    v[i * n + enu - 1] = q * z + p * v[i * n + enu];
                    v[i * n + enu] = q * v[i * n + enu] - p * z;
                }
            } else {
                // Complex pair: record (x+p, z) / (x+p, -z) without rotation
                d[enu - 1] = x + p;
                d[enu] = x + p;
                e[enu - 1] = z;
                e[enu] = -z;
            }
            en -= 2;
            iter = 0;
            trace!("francis qr: pair deflated at {}..={}", enu - 1, enu);
        } else {
            // No convergence yet: form a shift
            x = h[enu * n + enu];
            y = 0.0;
            w = 0.0;
            if l < enu {
                y = h[(enu - 1) * n + enu - 1];
                w = h[enu * n + enu - 1] * h[(enu - 1) * n + enu];
            }

            // Wilkinson's original ad hoc shift
            if iter == 10 {
                debug!("francis qr: exceptional shift at iteration 10");
                exshift += x;
                for i in low..=enu {
                    h[i * n + i] -= x;
                }
                s = h[enu * n + enu - 1].abs() + h[(enu - 1) * n + enu - 2].abs();
                x = 0.75 * s;
                y = x;
                w = -0.4375 * s * s;
            }

            // MATLAB's new ad hoc shift
            if iter == 30 {
                debug!("francis qr: exceptional shift at iteration 30");
                s = (y - x) / 2.0;
                s = s * s + w;
                if s > 0.0 {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / 2.0 + s);
                    for i in low..=enu {
                        h[i * n + i] -= s;
                    }
                    exshift += s;
                    x = 0.964;
                    y = 0.964;
                    w = 0.964;
                }
            }

            iter += 1;
            if iter > max_iterations {
                return Err(Error::ConvergenceFailure {
                    op: "francis qr iteration",
                    iterations: iter,
                });
            }

            // Look for two consecutive small sub-diagonal elements
            let mut m = enu - 2;
            loop {
                z = h[m * n + m];
                r = x - z;
                s = y - z;
                p = (r * s - w) / h[(m + 1) * n + m] + h[m * n + m + 1];
                q = h[(m + 1) * n + m + 1] - z - r - s;
                r = h[(m + 2) * n + m + 1];
                s = p.abs() + q.abs() + r.abs();
                p /= s;
                q /= s;
                r /= s;
                if m == l {
                    break;
                }
                if h[m * n + m - 1].abs() * (q.abs() + r.abs())
                    < EPS
                        * (p.abs()
                            * (h[(m - 1) * n + m - 1].abs()
                                + z.abs()
                                + h[(m + 1) * n + m + 1].abs()))
                {
                    break;
                }
                m -= 1;
            }
            for i in (m + 2)..=enu {
                h[i * n + i - 2] = 0.0;
                if i > m + 2 {
                    h[i * n + i - 3] = 0.0;
                }
            }

            // Double QR step on rows l..=en and columns m..=en
            for k in m..enu {
                let notlast = k != enu - 1;
                if k != m {
                    p = h[k * n + k - 1];
                    q = h[(k + 1) * n + k - 1];
                    r = if notlast { h[(k + 2) * n + k - 1] } else { 0.0 };
                    x = p.abs() + q.abs() + r.abs();
                    if x == 0.0 {
                        continue;
                    }
                    p /= x;
                    q /= x;
                    r /= x;
                }

                s = (p * p + q * q + r * r).sqrt();
                if p < 0.0 {
                    s = -s;
                }
                if s != 0.0 {
                    if k != m {
                        h[k * n + k - 1] = -s * x;
                    } else if l != m {
                        h[k * n + k - 1] = -h[k * n + k - 1];
                    }
                    p += s;
                    x = p / s;
                    y = q / s;
                    z = r / s;
                    q /= p;
                    r /= p;

                    // Row modification
                    for j in k..n {
                        p = h[k * n + j] + q * h[(k + 1) * n + j];
                        if notlast {
                            p += r * h[(k + 2) * n + j];
                            h[(k + 2) * n + j] -= p * z;
                        }
                        h[k * n + j] -= p * x;
                        h[(k + 1) * n + j] -= p * y;
                    }

                    // Column modification
                    for i in 0..=enu.min(k + 3) {
                        p = x * h[i * n + k] + y * h[i * n + k + 1];
                        if notlast {
                            p += z * h[i * n + k + 2];
                            h[i * n + k + 2] -= p * r;
                        }
                        h[i * n + k] -= p;
                        h[i * n + k + 1] -= p * q;
                    }

                    // Accumulate transformations
                    for i in low..=high {
                        p = x * v[i * n + k] + y * v[i * n + k + 1];
                        if notlast {
                            p += z * v[i * n + k + 2];
                            v[i * n + k + 2] -= p * r;
                        }
                        v[i * n + k] -= p;
                        v[i * n + k + 1] -= p * q;
                    }
                }
            }
        }
    }

    // Backsubstitute to find vectors of the (quasi-)triangular form
    if norm == 0.0 {
        return Ok(());
    }

    for en in (0..nn).rev() {
        p = d[en];
        q = e[en];

        if q == 0.0 {
            // Real eigenvalue: back-substitute rows above it
            let mut l = en;
            h[en * n + en] = 1.0;
            for i in (0..en).rev() {
                w = h[i * n + i] - p;
                r = 0.0;
                for j in l..=en {
                    r += h[i * n + j] * h[j * n + en];
                }
                if e[i] < 0.0 {
                    z = w;
                    s = r;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        h[i * n + en] = if w != 0.0 { -r / w } else { -r / (EPS * norm) };
                    } else {
                        // Solve the 2x2 rows of a conjugate pair together
                        x = h[i * n + i + 1];
                        y = h[(i + 1) * n + i];
                        q = (d[i] - p) * (d[i] - p) + e[i] * e[i];
                        t = (x * s - z * r) / q;
                        h[i * n + en] = t;
                        h[(i + 1) * n + en] = if x.abs() > z.abs() {
                            (-r - w * t) / x
                        } else {
                            (-s - y * t) / z
                        };
                    }

                    // Overflow control
                    t = h[i * n + en].abs();
                    if (EPS * t) * t > 1.0 {
                        for j in i..=en {
                            h[j * n + en] /= t;
                        }
                    }
                }
            }
        } else if q < 0.0 {
            // Complex pair: the column pair (en-1, en) carries the real and
            // imaginary eigenvector components
            let mut l = en - 1;

            // Last vector component imaginary, so the matrix is triangular
            if h[en * n + en - 1].abs() > h[(en - 1) * n + en].abs() {
                h[(en - 1) * n + en - 1] = q / h[en * n + en - 1];
                h[(en - 1) * n + en] = -(h[en * n + en] - p) / h[en * n + en - 1];
            } else {
                let (cr, ci) = cdiv(0.0, -h[(en - 1) * n + en], h[(en - 1) * n + en - 1] - p, q);
                h[(en - 1) * n + en - 1] = cr;
                h[(en - 1) * n + en] = ci;
            }
            h[en * n + en - 1] = 0.0;
            h[en * n + en] = 1.0;

            for i in (0..en.saturating_sub(1)).rev() {
                let mut ra = 0.0;
                let mut sa = 0.0;
                for j in l..=en {
                    ra += h[i * n + j] * h[j * n + en - 1];
                    sa += h[i * n + j] * h[j * n + en];
                }
                w = h[i * n + i] - p;

                if e[i] < 0.0 {
                    z = w;
                    r = ra;
                    s = sa;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        let (cr, ci) = cdiv(-ra, -sa, w, q);
                        h[i * n + en - 1] = cr;
                        h[i * n + en] = ci;
                    } else {
                        // Solve complex equations
                        x = h[i * n + i + 1];
                        y = h[(i + 1) * n + i];
                        let mut vr = (d[i] - p) * (d[i] - p) + e[i] * e[i] - q * q;
                        let vi = (d[i] - p) * 2.0 * q;
                        if vr == 0.0 && vi == 0.0 {
                            vr = EPS * norm * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                        }
                        let (cr, ci) =
                            cdiv(x * r - z * ra + q * sa, x * s - z * sa - q * ra, vr, vi);
                        h[i * n + en - 1] = cr;
                        h[i * n + en] = ci;
                        if x.abs() > z.abs() + q.abs() {
                            h[(i + 1) * n + en - 1] =
                                (-ra - w * h[i * n + en - 1] + q * h[i * n + en]) / x;
                            h[(i + 1) * n + en] =
                                (-sa - w * h[i * n + en] - q * h[i * n + en - 1]) / x;
                        } else {
                            let (cr, ci) =
                                cdiv(-r - y * h[i * n + en - 1], -s - y * h[i * n + en], z, q);
                            h[(i + 1) * n + en - 1] = cr;
                            h[(i + 1) * n + en] = ci;
                        }
                    }

                    // Overflow control
                    t = h[i * n + en - 1].abs().max(h[i * n + en].abs());
                    if (EPS * t) * t > 1.0 {
                        for j in i..=en {
                            h[j * n + en - 1] /= t;
                            h[j * n + en] /= t;
                        }
                    }
                }
            }
        }
    }

    // Back transformation to the original basis
    for j in (low..nn).rev() {
        for i in low..=high {
            z = 0.0;
            for k in low..=j.min(high) {
                z += v[i * n + k] * h[k * n + j];
            }
            v[i * n + j] = z;
        }
    }

    Ok(())
}

/// Complex scalar division `(xr + i xi) / (yr + i yi)`
fn cdiv(xr: f64, xi: f64, yr: f64, yi: f64) -> (f64, f64) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}
