//! Linear algebra utilities.
//!
//! Dense helpers for the small systems that appear in portfolio
//! optimization: vector products, quadratic forms and the saddle-point
//! (KKT) systems solved by the active-set method.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Singular values below this (relative to the largest) are treated as zero
/// in the least-squares fallback.
const SVD_EPSILON: f64 = 1e-14;

/// Dot product of two equally sized slices.
///
/// Extra trailing elements of the longer slice are ignored; callers validate
/// lengths at their boundary.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Dense matrix-vector product with a row-major `Vec<Vec<f64>>` matrix.
pub fn mat_vec(matrix: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| dot(row, v)).collect()
}

/// Quadratic form `vᵀ M v`.
pub fn quadratic_form(matrix: &[Vec<f64>], v: &[f64]) -> f64 {
    dot(v, &mat_vec(matrix, v))
}

/// Frobenius norm of a row-major matrix.
///
/// Used as a cheap upper bound on the spectral norm when choosing gradient
/// step sizes.
pub fn frobenius_norm(matrix: &[Vec<f64>]) -> f64 {
    matrix
        .iter()
        .flat_map(|row| row.iter())
        .map(|x| x * x)
        .sum::<f64>()
        .sqrt()
}

/// Infinity norm of a vector.
pub fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// Checks that `matrix` is `n x n`.
pub fn check_square(matrix: &[Vec<f64>], n: usize, context: &str) -> MathResult<()> {
    if matrix.len() != n {
        return Err(MathError::dimension_mismatch(
            format!("{context} rows"),
            n,
            matrix.len(),
        ));
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(MathError::dimension_mismatch(
                format!("{context} row {i}"),
                n,
                row.len(),
            ));
        }
    }
    Ok(())
}

/// Solves a symmetric saddle-point system
///
/// ```text
/// | H   Aᵀ | | x |   | r |
/// | A   0  | | y | = | s |
/// ```
///
/// `h` is `n x n`, `a` is `m x n`. Returns `(x, y)`.
///
/// LU with partial pivoting is tried first. When the system is singular
/// (for example an equality row that is linearly dependent on the others
/// once bound-active variables are removed), the minimum-norm least-squares
/// solution from the SVD is returned instead.
pub fn solve_kkt(
    h: &DMatrix<f64>,
    a: &DMatrix<f64>,
    r: &DVector<f64>,
    s: &DVector<f64>,
) -> MathResult<(DVector<f64>, DVector<f64>)> {
    let n = h.nrows();
    let m = a.nrows();
    if h.ncols() != n {
        return Err(MathError::dimension_mismatch("KKT Hessian columns", n, h.ncols()));
    }
    if m > 0 && a.ncols() != n {
        return Err(MathError::dimension_mismatch("KKT constraint columns", n, a.ncols()));
    }
    if r.len() != n {
        return Err(MathError::dimension_mismatch("KKT gradient", n, r.len()));
    }
    if s.len() != m {
        return Err(MathError::dimension_mismatch("KKT constraint rhs", m, s.len()));
    }

    let size = n + m;
    let mut kkt = DMatrix::<f64>::zeros(size, size);
    kkt.view_mut((0, 0), (n, n)).copy_from(h);
    if m > 0 {
        kkt.view_mut((n, 0), (m, n)).copy_from(a);
        kkt.view_mut((0, n), (n, m)).copy_from(&a.transpose());
    }

    let mut rhs = DVector::<f64>::zeros(size);
    rhs.rows_mut(0, n).copy_from(r);
    rhs.rows_mut(n, m).copy_from(s);

    let tolerance = 1e-9 * (1.0 + max_abs(rhs.as_slice()));
    let solution = match kkt.clone().lu().solve(&rhs) {
        Some(sol)
            if sol.iter().all(|v| v.is_finite())
                && max_abs((&kkt * &sol - &rhs).as_slice()) <= tolerance =>
        {
            sol
        }
        _ => {
            log::debug!("KKT system singular under LU, falling back to SVD (size {size})");
            kkt.svd(true, true)
                .solve(&rhs, SVD_EPSILON)
                .map_err(|_| MathError::SingularMatrix)?
        }
    };

    if !solution.iter().all(|v| v.is_finite()) {
        return Err(MathError::non_finite("KKT solve"));
    }

    let x = solution.rows(0, n).into_owned();
    let y = solution.rows(n, m).into_owned();
    Ok((x, y))
}
