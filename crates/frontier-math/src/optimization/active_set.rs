//! Primal active-set method for bound- and equality-constrained QPs.

use nalgebra::{DMatrix, DVector};

use super::{QpConfig, QpSolution, QuadraticProblem, QuadraticSolver};
use crate::error::{MathError, MathResult};
use crate::linear_algebra::{max_abs, solve_kkt};

/// Which side of its box a variable is fixed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Lower,
    Upper,
}

/// Primal active-set solver.
///
/// Keeps a working set of variables fixed at one of their bounds and, on
/// each iteration, solves the equality-constrained subproblem over the free
/// variables through its KKT system:
///
/// - if the step is non-zero, moves along it as far as the bounds allow,
///   fixing the first blocking variable;
/// - if the step is zero, checks the bound multipliers and releases the most
///   violated one, or stops at the optimum when all have the right sign.
///
/// The starting point must satisfy all constraints. For a convex problem
/// the method terminates at the global minimum in finitely many steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveSetSolver;

impl QuadraticSolver for ActiveSetSolver {
    fn solve(
        &self,
        problem: &QuadraticProblem,
        start: &[f64],
        config: &QpConfig,
    ) -> MathResult<QpSolution> {
        problem.validate()?;
        let n = problem.dimension();
        let m = problem.num_equalities();
        if start.len() != n {
            return Err(MathError::dimension_mismatch("starting point", n, start.len()));
        }

        let equality_violation = problem.equality_violation(start);
        if equality_violation > config.feasibility_tolerance {
            return Err(MathError::infeasible_start(format!(
                "equality residual {equality_violation:.3e}"
            )));
        }
        let bound_violation = problem.bound_violation(start);
        if bound_violation > config.feasibility_tolerance {
            return Err(MathError::infeasible_start(format!(
                "bound violation {bound_violation:.3e}"
            )));
        }

        let mut x = start.to_vec();
        problem.project_onto_bounds(&mut x);

        let mut working: Vec<Option<Bound>> = x
            .iter()
            .zip(problem.lower.iter().zip(&problem.upper))
            .map(|(&xi, (&lo, &hi))| {
                if xi <= lo {
                    Some(Bound::Lower)
                } else if xi >= hi {
                    Some(Bound::Upper)
                } else {
                    None
                }
            })
            .collect();

        let max_diag = (0..n)
            .map(|i| problem.hessian[i][i].abs())
            .fold(0.0_f64, f64::max);
        let ridge = config.regularization * max_diag.max(1.0);

        for iteration in 0..config.max_iterations {
            let gradient = problem.gradient(&x);
            let free: Vec<usize> = (0..n).filter(|&i| working[i].is_none()).collect();
            let nf = free.len();

            let h = DMatrix::from_fn(nf, nf, |r, c| {
                let value = problem.hessian[free[r]][free[c]];
                if r == c {
                    value + ridge
                } else {
                    value
                }
            });
            let a = DMatrix::from_fn(m, nf, |r, c| problem.equality_matrix[r][free[c]]);
            let rhs = DVector::from_fn(nf, |r, _| -gradient[free[r]]);
            let zeros = DVector::zeros(m);

            let (step, multipliers) = solve_kkt(&h, &a, &rhs, &zeros)?;

            let step_tolerance = config.tolerance * (1.0 + max_abs(&x));
            if max_abs(step.as_slice()) <= step_tolerance {
                // Bound multipliers: ν = g + Aᵀy, which must be ≥ 0 at a
                // lower bound and ≤ 0 at an upper bound.
                let mut release: Option<(usize, f64)> = None;
                for i in (0..n).filter(|&i| working[i].is_some()) {
                    let nu = gradient[i]
                        + (0..m)
                            .map(|k| problem.equality_matrix[k][i] * multipliers[k])
                            .sum::<f64>();
                    let violation = match working[i] {
                        Some(Bound::Lower) => -nu,
                        Some(Bound::Upper) => nu,
                        None => 0.0,
                    };
                    if violation > config.tolerance
                        && release.map_or(true, |(_, worst)| violation > worst)
                    {
                        release = Some((i, violation));
                    }
                }

                match release {
                    Some((i, violation)) => {
                        log::trace!("releasing bound on variable {i} (violation {violation:.3e})");
                        working[i] = None;
                    }
                    None => {
                        return Ok(finish(problem, x, iteration, true, config));
                    }
                }
                continue;
            }

            // Longest feasible step along the direction, at most 1.
            let mut alpha = 1.0;
            let mut blocking: Option<(usize, Bound)> = None;
            for (k, &i) in free.iter().enumerate() {
                let p = step[k];
                if p < 0.0 && problem.lower[i].is_finite() {
                    let limit = (problem.lower[i] - x[i]) / p;
                    if limit < alpha {
                        alpha = limit.max(0.0);
                        blocking = Some((i, Bound::Lower));
                    }
                } else if p > 0.0 && problem.upper[i].is_finite() {
                    let limit = (problem.upper[i] - x[i]) / p;
                    if limit < alpha {
                        alpha = limit.max(0.0);
                        blocking = Some((i, Bound::Upper));
                    }
                }
            }

            for (k, &i) in free.iter().enumerate() {
                x[i] += alpha * step[k];
            }

            if let Some((i, side)) = blocking {
                x[i] = match side {
                    Bound::Lower => problem.lower[i],
                    Bound::Upper => problem.upper[i],
                };
                working[i] = Some(side);
            }
        }

        log::debug!(
            "active-set solver stopped at iteration limit {}",
            config.max_iterations
        );
        Ok(finish(problem, x, config.max_iterations, false, config))
    }

    fn name(&self) -> &'static str {
        "Active Set"
    }
}

fn finish(
    problem: &QuadraticProblem,
    x: Vec<f64>,
    iterations: u32,
    optimal: bool,
    config: &QpConfig,
) -> QpSolution {
    let residual = max_abs(&problem.equality_residuals(&x));
    let feasible = residual <= config.feasibility_tolerance
        && problem.bound_violation(&x) <= config.feasibility_tolerance;
    let converged = optimal && feasible;
    let message = if converged {
        format!("Optimization terminated successfully after {iterations} iterations")
    } else if !optimal {
        format!("Iteration limit {iterations} reached (equality residual {residual:.3e})")
    } else {
        format!("Constraints not met to tolerance (equality residual {residual:.3e})")
    };

    QpSolution {
        objective: problem.objective(&x),
        x,
        iterations,
        converged,
        message,
    }
}
