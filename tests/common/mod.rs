//! Common test utilities
#![allow(dead_code)]

use linmat::Matrix;

/// Route `log` output through the test harness when RUST_LOG is set
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert all values are close within tolerance
pub fn assert_allclose(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Check if a matrix is close to identity
pub fn assert_near_identity(m: &Matrix, tol: f64, msg: &str) {
    for i in 0..m.rows() {
        for j in 0..m.cols() {
            let expected = if i == j { 1.0 } else { 0.0 };
            let actual = m.get(i, j);
            let diff = (actual - expected).abs();
            assert!(
                diff <= tol,
                "{}: element [{},{}] differs: {} vs {} (diff={})",
                msg,
                i,
                j,
                actual,
                expected,
                diff
            );
        }
    }
}

/// Check two matrices agree elementwise within tolerance
pub fn assert_matrix_close(a: &Matrix, b: &Matrix, tol: f64, msg: &str) {
    assert_eq!(a.rows(), b.rows(), "{}: row mismatch", msg);
    assert_eq!(a.cols(), b.cols(), "{}: col mismatch", msg);
    assert_allclose(a.as_slice(), b.as_slice(), 0.0, tol, msg);
}

/// Check values are sorted descending
pub fn assert_descending(values: &[f64], msg: &str) {
    for i in 1..values.len() {
        assert!(
            values[i - 1] >= values[i] - 1e-12,
            "{}: values[{}]={} should be >= values[{}]={}",
            msg,
            i - 1,
            values[i - 1],
            i,
            values[i]
        );
    }
}

/// Check values are sorted ascending
pub fn assert_ascending(values: &[f64], msg: &str) {
    for i in 1..values.len() {
        assert!(
            values[i - 1] <= values[i] + 1e-12,
            "{}: values[{}]={} should be <= values[{}]={}",
            msg,
            i - 1,
            values[i - 1],
            i,
            values[i]
        );
    }
}
