//! Accelerated projected gradient with an augmented Lagrangian.

use super::{QpConfig, QpSolution, QuadraticProblem, QuadraticSolver};
use crate::error::{MathError, MathResult};
use crate::linear_algebra::{dot, frobenius_norm, max_abs};
use crate::solvers::{brent, SolverConfig};

/// Gradient steps allowed per multiplier update.
const INNER_ITERATIONS: u32 = 20_000;

/// Cap on multiplier updates regardless of `QpConfig::max_iterations`.
const MAX_MULTIPLIER_UPDATES: u32 = 50;

/// Upper limit for the augmented-Lagrangian penalty.
const MAX_PENALTY: f64 = 1e8;

/// First-order solver for the same problem class as
/// [`ActiveSetSolver`](super::ActiveSetSolver).
///
/// - The box bounds together with the **first** equality row are handled by
///   exact projection (a one-dimensional root find on the projection
///   multiplier), so a budget constraint `Σx = 1` holds to round-off at every
///   iterate.
/// - Any further equality rows are handled by an augmented Lagrangian whose
///   multipliers are updated after each inner solve.
/// - Inner solves use FISTA with adaptive restart and a fixed step `1/L`,
///   where `L` bounds the Lipschitz constant of the gradient via Frobenius
///   norms.
///
/// The starting point only needs to be finite; it is projected first.
/// `config.max_iterations` bounds the number of multiplier updates (at most
/// 50).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedGradientSolver;

impl QuadraticSolver for ProjectedGradientSolver {
    fn solve(
        &self,
        problem: &QuadraticProblem,
        start: &[f64],
        config: &QpConfig,
    ) -> MathResult<QpSolution> {
        problem.validate()?;
        let n = problem.dimension();
        if start.len() != n {
            return Err(MathError::dimension_mismatch("starting point", n, start.len()));
        }
        if start.iter().any(|v| !v.is_finite()) {
            return Err(MathError::non_finite("projected gradient starting point"));
        }

        let (projected_row, penalized_rows, penalized_rhs) = split_constraints(problem);
        let mut multipliers = vec![0.0; penalized_rows.len()];
        let mut penalty = config.penalty.max(f64::EPSILON);

        let mut x = project(problem, projected_row.as_ref(), start);
        let hessian_norm = frobenius_norm(&problem.hessian);
        let rows_norm_sq = frobenius_norm(&penalized_rows).powi(2);

        let mut previous_residual = f64::INFINITY;
        let mut total_steps = 0_u32;
        let mut outer = 0_u32;
        let mut converged = false;

        while outer < config.max_iterations.clamp(1, MAX_MULTIPLIER_UPDATES) {
            outer += 1;
            let lipschitz = (hessian_norm + penalty * rows_norm_sq).max(f64::EPSILON);
            let step = 1.0 / lipschitz;

            let gradient = |y: &[f64]| -> Vec<f64> {
                let mut g = problem.gradient(y);
                for (k, row) in penalized_rows.iter().enumerate() {
                    let scale = multipliers[k] + penalty * (dot(row, y) - penalized_rhs[k]);
                    for (gi, ai) in g.iter_mut().zip(row) {
                        *gi += scale * ai;
                    }
                }
                g
            };

            let mut y = x.clone();
            let mut momentum = 1.0_f64;
            let mut inner_converged = false;

            for _ in 0..INNER_ITERATIONS {
                total_steps += 1;
                let g = gradient(&y);
                let trial: Vec<f64> = y.iter().zip(&g).map(|(yi, gi)| yi - step * gi).collect();
                let x_next = project(problem, projected_row.as_ref(), &trial);

                let change = max_abs(
                    &x_next
                        .iter()
                        .zip(&y)
                        .map(|(a, b)| a - b)
                        .collect::<Vec<_>>(),
                );
                if change <= config.tolerance * (1.0 + max_abs(&x_next)) {
                    x = x_next;
                    inner_converged = true;
                    break;
                }

                // Restart momentum when it points uphill.
                let uphill: f64 = y
                    .iter()
                    .zip(&x_next)
                    .zip(&x)
                    .map(|((yi, xn), xi)| (yi - xn) * (xn - xi))
                    .sum();
                let next_momentum = if uphill > 0.0 {
                    1.0
                } else {
                    0.5 * (1.0 + (1.0 + 4.0 * momentum * momentum).sqrt())
                };
                let beta = if uphill > 0.0 {
                    0.0
                } else {
                    (momentum - 1.0) / next_momentum
                };

                y = x_next
                    .iter()
                    .zip(&x)
                    .map(|(xn, xi)| xn + beta * (xn - xi))
                    .collect();
                x = x_next;
                momentum = next_momentum;
            }

            let residuals: Vec<f64> = penalized_rows
                .iter()
                .zip(&penalized_rhs)
                .map(|(row, b)| dot(row, &x) - b)
                .collect();
            let residual = max_abs(&residuals);

            if inner_converged && residual <= config.feasibility_tolerance {
                converged = true;
                break;
            }

            for (lambda, r) in multipliers.iter_mut().zip(&residuals) {
                *lambda += penalty * r;
            }
            if residual > 0.25 * previous_residual {
                penalty = (penalty * 10.0).min(MAX_PENALTY);
            }
            previous_residual = residual;
        }

        let violation = problem.equality_violation(&x);
        let feasible = violation <= config.feasibility_tolerance
            && problem.bound_violation(&x) <= config.feasibility_tolerance;
        let converged = converged && feasible;
        let message = if converged {
            format!("Optimization terminated successfully after {total_steps} gradient steps")
        } else {
            format!(
                "Projected gradient did not converge after {outer} multiplier updates \
                 (equality residual {violation:.3e})"
            )
        };
        log::debug!("projected gradient: {message}");

        Ok(QpSolution {
            objective: problem.objective(&x),
            x,
            iterations: outer,
            converged,
            message,
        })
    }

    fn name(&self) -> &'static str {
        "Projected Gradient"
    }
}

/// Equality row handled by exact projection.
struct ProjectedRow {
    row: Vec<f64>,
    rhs: f64,
}

fn split_constraints(problem: &QuadraticProblem) -> (Option<ProjectedRow>, Vec<Vec<f64>>, Vec<f64>) {
    let mut rows = problem.equality_matrix.iter().zip(&problem.equality_rhs);
    let projected = rows.next().map(|(row, &rhs)| ProjectedRow {
        row: row.clone(),
        rhs,
    });
    let (penalized_rows, penalized_rhs) = rows.map(|(row, &rhs)| (row.clone(), rhs)).unzip();
    (projected, penalized_rows, penalized_rhs)
}

/// Euclidean projection onto `{lower ≤ x ≤ upper, row · x = rhs}`.
///
/// The projection is `clamp(z - τ·row)` for the multiplier `τ` that makes the
/// row constraint hold; `row · clamp(z - τ·row)` is non-increasing in `τ`, so
/// `τ` is bracketed by doubling and then found with Brent's method. If the
/// constraint cannot be met inside the box the plain clamp is returned.
fn project(problem: &QuadraticProblem, constraint: Option<&ProjectedRow>, z: &[f64]) -> Vec<f64> {
    let bounds = problem.lower.iter().zip(&problem.upper);
    let Some(constraint) = constraint.filter(|c| c.row.iter().any(|a| *a != 0.0)) else {
        return z
            .iter()
            .zip(bounds)
            .map(|(zi, (&lo, &hi))| zi.clamp(lo, hi))
            .collect();
    };

    let clamp_at = |tau: f64| -> Vec<f64> {
        z.iter()
            .zip(&constraint.row)
            .zip(problem.lower.iter().zip(&problem.upper))
            .map(|((zi, ai), (&lo, &hi))| (zi - tau * ai).clamp(lo, hi))
            .collect()
    };
    let phi = |tau: f64| dot(&constraint.row, &clamp_at(tau)) - constraint.rhs;

    let mut lo = -1.0;
    let mut hi = 1.0;
    let mut bracketed = false;
    for _ in 0..64 {
        if phi(lo) >= 0.0 && phi(hi) <= 0.0 {
            bracketed = true;
            break;
        }
        lo *= 2.0;
        hi *= 2.0;
    }
    if !bracketed {
        return clamp_at(0.0);
    }

    let config = SolverConfig::new(1e-15, 200);
    match brent(phi, lo, hi, &config) {
        Ok(result) => clamp_at(result.root),
        Err(_) => clamp_at(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::ActiveSetSolver;
    use approx::assert_relative_eq;

    fn simplex_problem() -> QuadraticProblem {
        QuadraticProblem::new(vec![vec![2.0, 0.0], vec![0.0, 2.0]])
            .with_equality(vec![1.0, 1.0], 1.0)
            .with_uniform_bounds(0.0, 1.0)
    }

    #[test]
    fn test_projection_onto_simplex() {
        let problem = simplex_problem();
        let row = ProjectedRow {
            row: vec![1.0, 1.0],
            rhs: 1.0,
        };

        let x = project(&problem, Some(&row), &[0.9, 0.9]);
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.5, epsilon = 1e-12);

        let x = project(&problem, Some(&row), &[2.0, -1.0]);
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_minimum_norm_on_simplex() {
        let problem = simplex_problem();
        let result = ProjectedGradientSolver
            .solve(&problem, &[1.0, 0.0], &QpConfig::default())
            .unwrap();

        assert!(result.converged, "{}", result.message);
        assert_relative_eq!(result.x[0], 0.5, epsilon = 1e-8);
        assert_relative_eq!(result.x[1], 0.5, epsilon = 1e-8);
        assert_relative_eq!(result.x.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_infeasible_start_is_projected() {
        let problem = simplex_problem();
        let result = ProjectedGradientSolver
            .solve(&problem, &[5.0, 5.0], &QpConfig::default())
            .unwrap();
        assert!(result.converged);
        assert!(problem.bound_violation(&result.x) <= 1e-12);
    }

    #[test]
    fn test_agrees_with_active_set() {
        let problem = QuadraticProblem::new(vec![
            vec![0.04, 0.006, 0.002],
            vec![0.006, 0.09, 0.009],
            vec![0.002, 0.009, 0.01],
        ])
        .with_equality(vec![1.0, 1.0, 1.0], 1.0)
        .with_equality(vec![0.06, 0.10, 0.03], 0.05)
        .with_uniform_bounds(0.0, 1.0);

        let start = [1.0 / 3.0; 3];
        let exact = ActiveSetSolver
            .solve(&problem, &start, &QpConfig::default())
            .unwrap();
        let first_order = ProjectedGradientSolver
            .solve(&problem, &start, &QpConfig::default())
            .unwrap();

        assert!(exact.converged);
        assert!(first_order.converged, "{}", first_order.message);
        for (a, b) in exact.x.iter().zip(&first_order.x) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
        assert_relative_eq!(exact.objective, first_order.objective, epsilon = 1e-8);
    }

    #[test]
    fn test_rejects_non_finite_start() {
        let problem = simplex_problem();
        let result = ProjectedGradientSolver.solve(&problem, &[f64::NAN, 0.0], &QpConfig::default());
        assert!(matches!(result, Err(MathError::NonFinite { .. })));
    }
}
