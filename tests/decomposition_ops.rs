//! Integration tests for LU and QR decompositions
//!
//! Tests verify:
//! - LU reconstruction: L (unit lower) @ U (upper) reproduces the input
//! - QR reconstruction: Q @ R reproduces the input, Q^T @ Q is identity
//! - Least-squares solve for overdetermined systems
//! - Error taxonomy: NotSquare, DimensionMismatch, RankDeficient

use linmat::{Error, LuDecomposition, Matrix, QrDecomposition, Vector};

mod common;
use common::{assert_matrix_close, assert_near_identity};

#[test]
fn test_lu_reconstruction_4x4() {
    let a = Matrix::from_rows(&[
        &[4.0, 3.0, 2.0, 1.0],
        &[3.0, 4.0, 3.0, 2.0],
        &[2.0, 3.0, 4.0, 3.0],
        &[1.0, 2.0, 3.0, 4.0],
    ])
    .unwrap();
    let lu = LuDecomposition::new(&a).unwrap();
    let product = lu.l().matmul(&lu.u()).unwrap();
    assert_matrix_close(&product, &a, 1e-10, "L @ U");
}

#[test]
fn test_lu_solve_tridiagonal() {
    let a = Matrix::from_rows(&[&[2.0, -1.0, 0.0], &[-1.0, 2.0, -1.0], &[0.0, -1.0, 2.0]])
        .unwrap();
    let lu = LuDecomposition::new(&a).unwrap();
    let b = Vector::from_slice(&[1.0, 0.0, 1.0]);
    let x = lu.solve(&b).unwrap();

    // Residual check: A @ x == b
    let ax = a.mul_vec(&x).unwrap();
    for i in 0..3 {
        assert!((ax.get(i) - b.get(i)).abs() < 1e-10);
    }
}

#[test]
fn test_lu_determinant_matches_matrix_determinant() {
    // Well-conditioned without pivoting, so both paths agree
    let a = Matrix::from_rows(&[&[4.0, 1.0], &[2.0, 3.0]]).unwrap();
    let lu = LuDecomposition::new(&a).unwrap();
    assert!((lu.determinant() - 10.0).abs() < 1e-12);
    assert!((a.determinant().unwrap() - 10.0).abs() < 1e-12);
}

#[test]
fn test_qr_reconstruction_square() {
    let a = Matrix::from_rows(&[&[12.0, -51.0, 4.0], &[6.0, 167.0, -68.0], &[-4.0, 24.0, -41.0]])
        .unwrap();
    let qr = QrDecomposition::new(&a).unwrap();
    let product = qr.q().matmul(&qr.r()).unwrap();
    assert_matrix_close(&product, &a, 1e-9, "Q @ R");
}

#[test]
fn test_qr_orthonormality() {
    let a = Matrix::from_rows(&[&[12.0, -51.0, 4.0], &[6.0, 167.0, -68.0], &[-4.0, 24.0, -41.0]])
        .unwrap();
    let qr = QrDecomposition::new(&a).unwrap();
    let q = qr.q();
    let qtq = q.transpose().matmul(&q).unwrap();
    assert_near_identity(&qtq, 1e-12, "Q^T @ Q");
}

#[test]
fn test_qr_reconstruction_tall() {
    let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 7.0], &[-1.0, 1.0]]).unwrap();
    let qr = QrDecomposition::new(&a).unwrap();
    let product = qr.q().matmul(&qr.r()).unwrap();
    assert_matrix_close(&product, &a, 1e-12, "Q @ R for tall input");
    assert_near_identity(&qr.q().transpose().matmul(&qr.q()).unwrap(), 1e-12, "Q^T Q");
}

#[test]
fn test_qr_least_squares() {
    // Fit y = c0 + c1 * x through (0,1), (1,3), (2,5): exact line 1 + 2x
    let a = Matrix::from_rows(&[&[1.0, 0.0], &[1.0, 1.0], &[1.0, 2.0]]).unwrap();
    let b = Matrix::from_rows(&[&[1.0], &[3.0], &[5.0]]).unwrap();
    let qr = QrDecomposition::new(&a).unwrap();
    let x = qr.solve(&b).unwrap();
    assert_eq!(x.rows(), 2);
    assert!((x.get(0, 0) - 1.0).abs() < 1e-10);
    assert!((x.get(1, 0) - 2.0).abs() < 1e-10);
}

#[test]
fn test_qr_least_squares_overdetermined_residual() {
    // Inconsistent system: solution minimizes the residual.
    // Fit a constant through 1, 2, 3 -> mean = 2
    let a = Matrix::from_rows(&[&[1.0], &[1.0], &[1.0]]).unwrap();
    let b = Matrix::from_rows(&[&[1.0], &[2.0], &[3.0]]).unwrap();
    let qr = QrDecomposition::new(&a).unwrap();
    let x = qr.solve(&b).unwrap();
    assert!((x.get(0, 0) - 2.0).abs() < 1e-12);
}

#[test]
fn test_qr_solve_row_mismatch() {
    let a = Matrix::from_rows(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]).unwrap();
    let qr = QrDecomposition::new(&a).unwrap();
    let b = Matrix::zeros(2, 1);
    assert!(matches!(
        qr.solve(&b),
        Err(Error::DimensionMismatch { .. })
    ));
}

#[test]
fn test_qr_wide_is_rank_deficient() {
    let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
    assert!(matches!(
        QrDecomposition::new(&a),
        Err(Error::RankDeficient { .. })
    ));
}
