//! Optimization algorithms.
//!
//! This module solves convex quadratic programs of the form
//!
//! ```text
//! minimize    ½ xᵀ H x + cᵀ x
//! subject to  A x = b
//!             lower ≤ x ≤ upper
//! ```
//!
//! which covers minimum-variance and target-return portfolio problems.
//! Two strategies implement the [`QuadraticSolver`] trait:
//!
//! | Solver | Method | Needs feasible start | Accuracy |
//! |--------|--------|----------------------|----------|
//! | [`ActiveSetSolver`] | Primal active-set on the KKT system | Yes | Exact up to round-off |
//! | [`ProjectedGradientSolver`] | Augmented Lagrangian + accelerated projected gradient | No (bounds only) | First-order |
//!
//! Non-convergence is reported through [`QpSolution::converged`] rather than
//! an error; errors are reserved for malformed problems.

mod active_set;
mod projected_gradient;

pub use active_set::ActiveSetSolver;
pub use projected_gradient::ProjectedGradientSolver;

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};
use crate::linear_algebra::{check_square, dot, mat_vec, max_abs};

/// Configuration for quadratic-programming solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpConfig {
    /// Tolerance on step length and optimality multipliers.
    pub tolerance: f64,
    /// Maximum allowed violation of equality and bound constraints.
    pub feasibility_tolerance: f64,
    /// Maximum number of iterations (working-set changes for active-set,
    /// multiplier updates for projected gradient).
    pub max_iterations: u32,
    /// Relative ridge added to the Hessian diagonal in KKT solves; only
    /// needed for singular (semi-definite) Hessians.
    pub regularization: f64,
    /// Initial penalty weight of the augmented Lagrangian.
    pub penalty: f64,
}

impl Default for QpConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            feasibility_tolerance: 1e-9,
            max_iterations: 500,
            regularization: 0.0,
            penalty: 10.0,
        }
    }
}

impl QpConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the optimality tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the feasibility tolerance.
    #[must_use]
    pub fn with_feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.feasibility_tolerance = tolerance;
        self
    }

    /// Sets the iteration limit.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Which quadratic-programming strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverKind {
    /// Primal active-set method.
    #[default]
    ActiveSet,
    /// Augmented-Lagrangian projected gradient.
    ProjectedGradient,
}

impl SolverKind {
    /// Returns a human-readable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActiveSet => "Active Set",
            Self::ProjectedGradient => "Projected Gradient",
        }
    }

    /// Returns the solver implementation for this kind.
    #[must_use]
    pub fn solver(&self) -> Box<dyn QuadraticSolver> {
        match self {
            Self::ActiveSet => Box::new(ActiveSetSolver),
            Self::ProjectedGradient => Box::new(ProjectedGradientSolver),
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A convex quadratic program with linear equalities and box bounds.
#[derive(Debug, Clone)]
pub struct QuadraticProblem {
    /// Symmetric positive semi-definite Hessian `H` (n x n).
    pub hessian: Vec<Vec<f64>>,
    /// Linear term `c` (length n).
    pub linear: Vec<f64>,
    /// Equality constraint rows `A` (m x n).
    pub equality_matrix: Vec<Vec<f64>>,
    /// Equality right-hand side `b` (length m).
    pub equality_rhs: Vec<f64>,
    /// Lower bounds (length n).
    pub lower: Vec<f64>,
    /// Upper bounds (length n).
    pub upper: Vec<f64>,
}

impl QuadraticProblem {
    /// Creates an unconstrained problem `min ½ xᵀ H x`.
    #[must_use]
    pub fn new(hessian: Vec<Vec<f64>>) -> Self {
        let n = hessian.len();
        Self {
            hessian,
            linear: vec![0.0; n],
            equality_matrix: Vec::new(),
            equality_rhs: Vec::new(),
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    /// Sets the linear term.
    #[must_use]
    pub fn with_linear(mut self, linear: Vec<f64>) -> Self {
        self.linear = linear;
        self
    }

    /// Adds one equality constraint `row · x = rhs`.
    #[must_use]
    pub fn with_equality(mut self, row: Vec<f64>, rhs: f64) -> Self {
        self.equality_matrix.push(row);
        self.equality_rhs.push(rhs);
        self
    }

    /// Sets the same bounds on every variable.
    #[must_use]
    pub fn with_uniform_bounds(mut self, lower: f64, upper: f64) -> Self {
        let n = self.dimension();
        self.lower = vec![lower; n];
        self.upper = vec![upper; n];
        self
    }

    /// Number of decision variables.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.hessian.len()
    }

    /// Number of equality constraints.
    #[must_use]
    pub fn num_equalities(&self) -> usize {
        self.equality_matrix.len()
    }

    /// Checks that every component has consistent dimensions.
    pub fn validate(&self) -> MathResult<()> {
        let n = self.dimension();
        if n == 0 {
            return Err(MathError::invalid_input("quadratic problem has no variables"));
        }
        check_square(&self.hessian, n, "Hessian")?;
        if self.linear.len() != n {
            return Err(MathError::dimension_mismatch("linear term", n, self.linear.len()));
        }
        if self.equality_rhs.len() != self.equality_matrix.len() {
            return Err(MathError::dimension_mismatch(
                "equality rhs",
                self.equality_matrix.len(),
                self.equality_rhs.len(),
            ));
        }
        for (k, row) in self.equality_matrix.iter().enumerate() {
            if row.len() != n {
                return Err(MathError::dimension_mismatch(
                    format!("equality row {k}"),
                    n,
                    row.len(),
                ));
            }
        }
        if self.lower.len() != n || self.upper.len() != n {
            return Err(MathError::dimension_mismatch(
                "bounds",
                n,
                self.lower.len().min(self.upper.len()),
            ));
        }
        if let Some(i) = (0..n).find(|&i| self.lower[i] > self.upper[i]) {
            return Err(MathError::invalid_input(format!(
                "lower bound exceeds upper bound for variable {i}"
            )));
        }
        Ok(())
    }

    /// Objective value at `x`.
    pub fn objective(&self, x: &[f64]) -> f64 {
        0.5 * dot(x, &mat_vec(&self.hessian, x)) + dot(&self.linear, x)
    }

    /// Gradient `H x + c` at `x`.
    pub fn gradient(&self, x: &[f64]) -> Vec<f64> {
        mat_vec(&self.hessian, x)
            .into_iter()
            .zip(&self.linear)
            .map(|(hx, c)| hx + c)
            .collect()
    }

    /// Equality residuals `A x - b`.
    pub fn equality_residuals(&self, x: &[f64]) -> Vec<f64> {
        self.equality_matrix
            .iter()
            .zip(&self.equality_rhs)
            .map(|(row, b)| dot(row, x) - b)
            .collect()
    }

    /// Largest absolute equality residual.
    pub fn equality_violation(&self, x: &[f64]) -> f64 {
        max_abs(&self.equality_residuals(x))
    }

    /// Largest violation of the box bounds.
    pub fn bound_violation(&self, x: &[f64]) -> f64 {
        x.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(&xi, (&lo, &hi))| (lo - xi).max(xi - hi).max(0.0))
            .fold(0.0, f64::max)
    }

    /// Projects `x` onto the box bounds in place.
    pub fn project_onto_bounds(&self, x: &mut [f64]) {
        for (xi, (&lo, &hi)) in x.iter_mut().zip(self.lower.iter().zip(&self.upper)) {
            *xi = xi.clamp(lo, hi);
        }
    }
}

/// Result of a quadratic-programming run.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// Best point found.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub objective: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Whether the optimality and feasibility tolerances were met.
    pub converged: bool,
    /// Diagnostic message.
    pub message: String,
}

/// Trait for quadratic-programming strategies.
///
/// Implementations are stateless; the same solver value can be shared
/// across threads and calls.
pub trait QuadraticSolver: Send + Sync {
    /// Solves `problem` starting from `start`.
    ///
    /// Returns `Err` only for malformed input. A run that stops without
    /// meeting the tolerances returns `Ok` with `converged == false` and the
    /// best point found.
    fn solve(
        &self,
        problem: &QuadraticProblem,
        start: &[f64],
        config: &QpConfig,
    ) -> MathResult<QpSolution>;

    /// Returns the name of the solver.
    fn name(&self) -> &'static str;
}
