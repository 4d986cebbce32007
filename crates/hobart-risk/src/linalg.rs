//! Symmetric matrix utilities
//!
//! Eigenvalue decomposition and positive semi-definiteness checks used to
//! validate covariance matrices, plus the small numerical helpers shared by
//! the risk calculator.

use crate::error::ConfigurationError;
use ndarray::{Array1, Array2};

/// Default tolerance for symmetry and positive semi-definiteness checks.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Check whether a matrix is square and symmetric within `tolerance`.
pub fn is_symmetric(matrix: &Array2<f64>, tolerance: f64) -> bool {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return false;
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let scale = matrix[[i, j]].abs().max(matrix[[j, i]].abs()).max(1.0);
            if (matrix[[i, j]] - matrix[[j, i]]).abs() > tolerance * scale {
                return false;
            }
        }
    }
    true
}

/// Check whether a matrix is positive semi-definite
///
/// The matrix must be square and symmetric; all eigenvalues must be at least
/// `-tolerance` scaled by the largest diagonal magnitude.
///
/// # Arguments
/// * `matrix` - Matrix to check
/// * `tolerance` - Relative tolerance for negative eigenvalues
pub fn is_positive_semidefinite(matrix: &Array2<f64>, tolerance: f64) -> bool {
    if !is_symmetric(matrix, tolerance) {
        return false;
    }
    min_eigenvalue(matrix).is_ok_and(|min| min >= -tolerance * diagonal_scale(matrix))
}

/// Smallest eigenvalue of a symmetric matrix.
///
/// An empty matrix has no eigenvalues and reports zero.
pub fn min_eigenvalue(matrix: &Array2<f64>) -> Result<f64, ConfigurationError> {
    let decomp = jacobi_eigendecomp(matrix, DEFAULT_TOLERANCE)?;
    Ok(decomp
        .eigenvalues
        .iter()
        .copied()
        .reduce(f64::min)
        .unwrap_or(0.0))
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// Repeatedly annihilates the largest off-diagonal element until every
/// off-diagonal element is below `tolerance` (relative to the matrix scale)
/// or the rotation budget is exhausted.
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `tolerance` - Convergence tolerance for off-diagonal elements
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    tolerance: f64,
) -> Result<EigenDecomposition, ConfigurationError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(ConfigurationError::DimensionMismatch {
            what: "symmetric matrix",
            expected: (n, n),
            actual: matrix.dim(),
        });
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let threshold = tolerance * diagonal_scale(matrix);
    let max_rotations = 100 + 50 * n * n;

    for _ in 0..max_rotations {
        let Some((p, q, max_val)) = largest_off_diagonal(&a) else {
            break;
        };
        if max_val.abs() <= threshold {
            break;
        }

        let (cos_theta, sin_theta) = rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
        apply_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = indices.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        eigenvectors.column_mut(new_idx).assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

/// Quadratic form `xᵀ·M·x`.
pub(crate) fn quadratic_form(matrix: &Array2<f64>, x: &Array1<f64>) -> f64 {
    x.dot(&matrix.dot(x))
}

/// Standard deviation from a variance, flooring rounding noise below zero.
pub(crate) fn risk_from_variance(variance: f64) -> f64 {
    variance.max(0.0).sqrt()
}

/// `sign(d) · sqrt(|d|)`, zero at zero.
pub(crate) fn signed_sqrt(d: f64) -> f64 {
    if d == 0.0 { 0.0 } else { d.signum() * d.abs().sqrt() }
}

fn diagonal_scale(matrix: &Array2<f64>) -> f64 {
    matrix
        .diag()
        .iter()
        .fold(1.0_f64, |acc, value| acc.max(value.abs()))
}

/// Largest off-diagonal element by magnitude as `(row, col, value)`.
fn largest_off_diagonal(matrix: &Array2<f64>) -> Option<(usize, usize, f64)> {
    let n = matrix.nrows();
    let mut best: Option<(usize, usize, f64)> = None;

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]];
            if best.is_none_or(|(_, _, b)| val.abs() > b.abs()) {
                best = Some((i, j, val));
            }
        }
    }
    best
}

/// Rotation `(cos, sin)` that zeroes `a[p, q]`.
fn rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq == 0.0 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    (cos_theta, t * cos_theta)
}

fn apply_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    c: f64,
    s: f64,
) {
    let n = a.nrows();
    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
    a[[q, q]] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = c * aip - s * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = s * aip + c * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = c * vip - s * viq;
        v[[i, q]] = s * vip + c * viq;
    }
}
