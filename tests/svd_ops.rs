//! Integration tests for singular value decomposition
//!
//! Tests verify:
//! - Reconstruction: U @ S @ V^T reproduces the input
//! - Orthogonality: U^T @ U and V^T @ V are identity for full-rank input
//! - Singular values non-negative and sorted descending
//! - Wide input handled via internal transpose
//! - Scalar summaries: max singular value, condition number, rank

use linmat::{EigenDecomposition, Matrix, SvdDecomposition, SvdOptions};

mod common;
use common::{assert_descending, assert_matrix_close, assert_near_identity, init_logging};

fn reconstruct(svd: &SvdDecomposition) -> Matrix {
    let u = svd.u().expect("U requested");
    let v = svd.v().expect("V requested");
    u.matmul(&svd.singular_value_matrix())
        .unwrap()
        .matmul(&v.transpose())
        .unwrap()
}

#[test]
fn test_svd_reconstruction_square() {
    init_logging();
    let a = Matrix::from_rows(&[&[4.0, 0.0], &[3.0, -5.0]]).unwrap();
    let svd = SvdDecomposition::new(&a).unwrap();

    assert_descending(svd.singular_values(), "singular values");
    assert!(svd.singular_values().iter().all(|&s| s >= 0.0));
    assert_matrix_close(&reconstruct(&svd), &a, 1e-9, "U @ S @ V^T");
}

#[test]
fn test_svd_orthogonality_square() {
    let a = Matrix::from_rows(&[&[2.0, 1.0, 0.0], &[-1.0, 3.0, 1.0], &[0.0, 1.0, -2.0]])
        .unwrap();
    let svd = SvdDecomposition::new(&a).unwrap();
    let u = svd.u().unwrap();
    let v = svd.v().unwrap();
    assert_near_identity(&u.transpose().matmul(u).unwrap(), 1e-9, "U^T @ U");
    assert_near_identity(&v.transpose().matmul(v).unwrap(), 1e-9, "V^T @ V");
}

#[test]
fn test_svd_tall() {
    let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0], &[7.0, 8.0]]).unwrap();
    let svd = SvdDecomposition::new(&a).unwrap();

    let u = svd.u().unwrap();
    let v = svd.v().unwrap();
    assert_eq!(u.rows(), 4);
    assert_eq!(u.cols(), 2);
    assert_eq!(v.rows(), 2);
    assert_eq!(v.cols(), 2);
    assert_matrix_close(&reconstruct(&svd), &a, 1e-9, "tall reconstruction");
    assert_near_identity(&u.transpose().matmul(u).unwrap(), 1e-9, "U^T @ U thin");
}

#[test]
fn test_svd_wide_transposes_internally() {
    let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
    let svd = SvdDecomposition::new(&a).unwrap();

    let u = svd.u().unwrap();
    let v = svd.v().unwrap();
    assert_eq!(u.rows(), 2);
    assert_eq!(u.cols(), 2);
    assert_eq!(v.rows(), 3);
    assert_eq!(v.cols(), 2);
    assert_descending(svd.singular_values(), "singular values of wide input");
    assert_matrix_close(&reconstruct(&svd), &a, 1e-9, "wide reconstruction");
}

#[test]
fn test_svd_known_values() {
    // [[3, 0], [0, -2]]: singular values 3, 2
    let a = Matrix::from_rows(&[&[3.0, 0.0], &[0.0, -2.0]]).unwrap();
    let svd = SvdDecomposition::new(&a).unwrap();
    assert!((svd.singular_values()[0] - 3.0).abs() < 1e-12);
    assert!((svd.singular_values()[1] - 2.0).abs() < 1e-12);
    assert!((svd.max_singular_value() - 3.0).abs() < 1e-12);
    assert!((svd.cond() - 1.5).abs() < 1e-12);
}

#[test]
fn test_svd_rank() {
    // Rank-1 outer product
    let a = Matrix::from_rows(&[&[3.0, 4.0], &[6.0, 8.0]]).unwrap();
    let svd = SvdDecomposition::new(&a).unwrap();
    assert_eq!(svd.rank(), 1);

    let full = Matrix::from_rows(&[&[3.0, 0.0], &[0.0, 2.0]]).unwrap();
    assert_eq!(SvdDecomposition::new(&full).unwrap().rank(), 2);
}

#[test]
fn test_svd_u_only() {
    let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]).unwrap();
    let svd = SvdDecomposition::with_options(
        &a,
        SvdOptions {
            compute_u: true,
            compute_v: false,
            ..SvdOptions::default()
        },
    )
    .unwrap();
    assert!(svd.u().is_some());
    assert!(svd.v().is_none());

    // Singular values must match the both-factors run
    let both = SvdDecomposition::new(&a).unwrap();
    for (a, b) in svd.singular_values().iter().zip(both.singular_values()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_svd_matches_eigenvalues_of_gram_matrix() {
    // Singular values are sqrt of eigenvalues of A^T @ A
    let a = Matrix::from_rows(&[&[2.0, 1.0], &[1.0, 3.0], &[0.0, 1.0]]).unwrap();
    let svd = SvdDecomposition::new(&a).unwrap();

    let gram = a.transpose().matmul(&a).unwrap();
    let eig = EigenDecomposition::new(&gram).unwrap();
    // Eigenvalues ascending, singular values descending
    let k = svd.singular_values().len();
    for i in 0..k {
        let sv = svd.singular_values()[i];
        let ev = eig.real_eigenvalues()[k - 1 - i];
        assert!((sv * sv - ev).abs() < 1e-9, "sigma^2 == lambda");
    }
}
