//! Constrained portfolio optimizer.
//!
//! Every problem is long-only and fully invested:
//!
//! ```text
//! Σ w_i = 1,   0 ≤ w_i ≤ 1
//! ```
//!
//! with at most one extra condition:
//!
//! - [`OptimizationTarget::MinVariance`]: minimize `wᵀ Σ w`.
//! - [`OptimizationTarget::Return`]: minimize `wᵀ Σ w` subject to `w · μ = r`.
//! - [`OptimizationTarget::Risk`]: maximize `w · μ` subject to
//!   `sqrt(wᵀ Σ w) = σ`.
//!
//! The first two are convex quadratic programs handed to a
//! [`QuadraticSolver`]. The risk target is answered on the efficient frontier:
//! between the minimum-variance portfolio and the highest-return asset the
//! frontier volatility increases with return, so the return whose frontier
//! volatility equals `σ` is found with Brent's method.
//!
//! A solver that stops short of its tolerances is not an error. The best
//! point found is returned with `success = false` and a diagnostic message.

use std::cell::{Cell, RefCell};
use std::fmt;

use frontier_math::linear_algebra::dot;
use frontier_math::optimization::{QpSolution, QuadraticProblem, QuadraticSolver};
use frontier_math::solvers::{brent, SolverConfig};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{PortfolioError, PortfolioResult};
use crate::metrics::{portfolio_metrics, PortfolioMetrics};
use crate::universe::AssetUniverse;

/// Allowed `|Σw - 1|` for a successful solve.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// Allowed excursion outside `[0, 1]` before a weight counts as a violation.
/// Excursions within it are clamped away.
pub const BOUND_TOLERANCE: f64 = 1e-12;

/// Allowed `|w · μ - r|` for a return target.
pub const RETURN_TOLERANCE: f64 = 1e-8;

/// Allowed `|σ - target|` for a risk target.
pub const RISK_TOLERANCE: f64 = 1e-6;

/// Brent tolerance on the return axis when solving for a risk target.
const RISK_SEARCH_TOLERANCE: f64 = 1e-11;

/// What the optimizer should achieve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OptimizationTarget {
    /// Global minimum-variance portfolio.
    #[default]
    MinVariance,
    /// Minimum variance at the given expected return.
    Return(f64),
    /// Maximum expected return at the given volatility.
    Risk(f64),
}

impl OptimizationTarget {
    /// Builds a target from the optional request parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::ConflictingTargets`] when both are set.
    pub fn from_options(
        target_risk: Option<f64>,
        target_return: Option<f64>,
    ) -> PortfolioResult<Self> {
        match (target_risk, target_return) {
            (Some(_), Some(_)) => Err(PortfolioError::ConflictingTargets),
            (Some(risk), None) => Ok(Self::Risk(risk)),
            (None, Some(ret)) => Ok(Self::Return(ret)),
            (None, None) => Ok(Self::MinVariance),
        }
    }

    fn validate(self) -> PortfolioResult<()> {
        match self {
            Self::MinVariance => Ok(()),
            Self::Return(r) if !r.is_finite() => Err(PortfolioError::invalid_target(format!(
                "target return {r} is not finite"
            ))),
            Self::Risk(s) if !s.is_finite() || s < 0.0 => Err(PortfolioError::invalid_target(
                format!("target risk {s} must be a non-negative finite volatility"),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for OptimizationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinVariance => write!(f, "minimum variance"),
            Self::Return(r) => write!(f, "target return {r:.6}"),
            Self::Risk(s) => write!(f, "target risk {s:.6}"),
        }
    }
}

/// Result of one optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// The target that was requested.
    pub target: OptimizationTarget,
    /// Best weights found, one per asset.
    pub weights: Vec<f64>,
    /// Metrics of `weights`.
    pub metrics: PortfolioMetrics,
    /// Whether every constraint and the target were met to tolerance.
    pub success: bool,
    /// Solver diagnostic.
    pub message: String,
    /// Solver iterations, summed over all inner solves.
    pub iterations: u32,
}

/// Solves single-period allocation problems over one universe.
///
/// Each call starts from equal weights, so identical inputs give identical
/// outputs. Return targets move that start along the segment towards the
/// highest- or lowest-return asset until the return condition holds, which
/// gives the active-set method the feasible point it needs.
pub struct PortfolioOptimizer<'a> {
    universe: &'a AssetUniverse,
    config: &'a EngineConfig,
    solver: Box<dyn QuadraticSolver>,
}

impl<'a> PortfolioOptimizer<'a> {
    /// Creates an optimizer using the solver named in `config`.
    #[must_use]
    pub fn new(universe: &'a AssetUniverse, config: &'a EngineConfig) -> Self {
        Self {
            universe,
            config,
            solver: config.solver.solver(),
        }
    }

    /// Replaces the quadratic-programming strategy.
    #[must_use]
    pub fn with_solver(mut self, solver: Box<dyn QuadraticSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Name of the active solver.
    #[must_use]
    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Solves for `target`.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite targets or a malformed problem.
    /// Non-convergence is reported through
    /// [`OptimizationOutcome::success`].
    pub fn optimize(&self, target: OptimizationTarget) -> PortfolioResult<OptimizationOutcome> {
        target.validate()?;
        let outcome = match target {
            OptimizationTarget::MinVariance => self.min_variance()?,
            OptimizationTarget::Return(r) => self.for_return(r)?,
            OptimizationTarget::Risk(s) => self.for_risk(s)?,
        };

        if outcome.success {
            tracing::debug!(
                %target,
                iterations = outcome.iterations,
                expected_return = outcome.metrics.expected_return,
                volatility = outcome.metrics.volatility,
                "optimization converged"
            );
        } else {
            tracing::warn!(%target, message = %outcome.message, "optimization did not fully converge");
        }
        Ok(outcome)
    }

    fn budget_problem(&self) -> QuadraticProblem {
        // ½ wᵀ(2Σ)w so the objective equals the variance.
        let hessian = self
            .universe
            .covariance()
            .iter()
            .map(|row| row.iter().map(|v| 2.0 * v).collect())
            .collect();
        QuadraticProblem::new(hessian)
            .with_equality(vec![1.0; self.universe.len()], 1.0)
            .with_uniform_bounds(0.0, 1.0)
    }

    fn min_variance(&self) -> PortfolioResult<OptimizationOutcome> {
        let problem = self.budget_problem();
        let solution = self
            .solver
            .solve(&problem, &self.universe.equal_weights(), &self.config.qp)?;
        self.finish(OptimizationTarget::MinVariance, solution)
    }

    fn for_return(&self, target: f64) -> PortfolioResult<OptimizationOutcome> {
        let (_, lowest) = self.universe.min_return_asset();
        let (_, highest) = self.universe.max_return_asset();
        if target < lowest - RETURN_TOLERANCE || target > highest + RETURN_TOLERANCE {
            return self.fixed(
                OptimizationTarget::Return(target),
                self.universe.equal_weights(),
                false,
                format!(
                    "Target return {target:.6} is outside the achievable range [{lowest:.6}, {highest:.6}]"
                ),
                0,
            );
        }

        let rhs = target.clamp(lowest, highest);
        let problem = self
            .budget_problem()
            .with_equality(self.universe.expected_returns().to_vec(), rhs);
        let start = self.return_start(rhs);
        let solution = self.solver.solve(&problem, &start, &self.config.qp)?;
        self.finish(OptimizationTarget::Return(target), solution)
    }

    /// Equal weights moved towards a single extreme asset until `w · μ = r`.
    fn return_start(&self, target: f64) -> Vec<f64> {
        let equal = self.universe.equal_weights();
        let equal_return = dot(&equal, self.universe.expected_returns());

        let (index, extreme) = if target > equal_return {
            self.universe.max_return_asset()
        } else if target < equal_return {
            self.universe.min_return_asset()
        } else {
            return equal;
        };
        let span = extreme - equal_return;
        if span.abs() < f64::EPSILON {
            return equal;
        }

        let t = ((target - equal_return) / span).clamp(0.0, 1.0);
        let mut start: Vec<f64> = equal.iter().map(|w| w * (1.0 - t)).collect();
        start[index] += t;
        start
    }

    fn for_risk(&self, target: f64) -> PortfolioResult<OptimizationOutcome> {
        let risk = OptimizationTarget::Risk(target);
        let min_variance = self.min_variance()?;
        if !min_variance.success {
            return self.fixed(
                risk,
                min_variance.weights,
                false,
                format!("Minimum-variance solve failed: {}", min_variance.message),
                min_variance.iterations,
            );
        }

        let floor_volatility = min_variance.metrics.volatility;
        let floor_return = min_variance.metrics.expected_return;
        let (top, top_return) = self.universe.max_return_asset();
        let top_weights = self.universe.single_asset_weights(top);
        let top_volatility = self.universe.asset_volatility(top).unwrap_or_default();

        if target < floor_volatility - RISK_TOLERANCE {
            return self.fixed(
                risk,
                min_variance.weights,
                false,
                format!(
                    "Target risk {target:.6} is below the minimum achievable volatility {floor_volatility:.6}"
                ),
                min_variance.iterations,
            );
        }
        if target <= floor_volatility + RISK_TOLERANCE {
            return self.fixed(
                risk,
                min_variance.weights,
                true,
                min_variance.message,
                min_variance.iterations,
            );
        }
        if target > top_volatility + RISK_TOLERANCE || top_return <= floor_return {
            return self.fixed(
                risk,
                top_weights,
                false,
                format!(
                    "Target risk {target:.6} is above the volatility {top_volatility:.6} of the highest-return asset"
                ),
                min_variance.iterations,
            );
        }
        if target >= top_volatility - RISK_TOLERANCE {
            return self.fixed(
                risk,
                top_weights,
                true,
                "Target risk met by the highest-return asset".to_string(),
                min_variance.iterations,
            );
        }

        let iterations = Cell::new(min_variance.iterations);
        let failure: RefCell<Option<PortfolioError>> = RefCell::new(None);
        let stalled: RefCell<Option<String>> = RefCell::new(None);
        let frontier_volatility = |r: f64| -> f64 {
            if r >= top_return {
                return top_volatility - target;
            }
            // An unconverged point would steer the bracket; stop evaluating.
            if failure.borrow().is_some() || stalled.borrow().is_some() {
                return f64::NAN;
            }
            match self.for_return(r) {
                Ok(outcome) => {
                    iterations.set(iterations.get() + outcome.iterations);
                    if outcome.success {
                        outcome.metrics.volatility - target
                    } else {
                        stalled.borrow_mut().get_or_insert(outcome.message);
                        f64::NAN
                    }
                }
                Err(e) => {
                    failure.borrow_mut().get_or_insert(e);
                    f64::NAN
                }
            }
        };

        let search = SolverConfig::new(RISK_SEARCH_TOLERANCE, 100);
        let root = brent(frontier_volatility, floor_return, top_return, &search);
        if let Some(e) = failure.into_inner() {
            return Err(e);
        }
        if let Some(message) = stalled.into_inner() {
            return self.fixed(
                risk,
                min_variance.weights,
                false,
                format!("Risk target search stopped at an unconverged frontier point: {message}"),
                iterations.get(),
            );
        }
        let root = match root {
            Ok(root) => root,
            Err(e) => {
                return self.fixed(
                    risk,
                    min_variance.weights,
                    false,
                    format!("Risk target search failed: {e}"),
                    iterations.get(),
                );
            }
        };

        let mut outcome = self.for_return(root.root.min(top_return))?;
        outcome.target = risk;
        outcome.iterations += iterations.get();
        let residual = (outcome.metrics.volatility - target).abs();
        if outcome.success && residual > RISK_TOLERANCE {
            outcome.success = false;
            outcome.message = format!("Volatility misses target {target:.6} by {residual:.3e}");
        } else if outcome.success {
            outcome.message = format!(
                "Target risk met after {} return searches",
                root.iterations
            );
        }
        Ok(outcome)
    }

    /// Outcome for weights that were not produced by a QP solve.
    fn fixed(
        &self,
        target: OptimizationTarget,
        weights: Vec<f64>,
        success: bool,
        message: String,
        iterations: u32,
    ) -> PortfolioResult<OptimizationOutcome> {
        let metrics = portfolio_metrics(self.universe, &weights, self.config.drawdown_multiplier)?;
        Ok(OptimizationOutcome {
            target,
            weights,
            metrics,
            success,
            message,
            iterations,
        })
    }

    fn finish(
        &self,
        target: OptimizationTarget,
        solution: QpSolution,
    ) -> PortfolioResult<OptimizationOutcome> {
        let mut weights = solution.x;
        let in_bounds = weights
            .iter()
            .all(|w| (-BOUND_TOLERANCE..=1.0 + BOUND_TOLERANCE).contains(w));
        for w in &mut weights {
            *w = w.clamp(0.0, 1.0);
        }

        let metrics = portfolio_metrics(self.universe, &weights, self.config.drawdown_multiplier)?;
        let sum_error = (weights.iter().sum::<f64>() - 1.0).abs();
        let target_residual = match target {
            OptimizationTarget::MinVariance => 0.0,
            OptimizationTarget::Return(r) => (metrics.expected_return - r).abs(),
            OptimizationTarget::Risk(s) => (metrics.volatility - s).abs(),
        };
        let target_tolerance = match target {
            OptimizationTarget::Risk(_) => RISK_TOLERANCE,
            _ => RETURN_TOLERANCE,
        };

        let (success, message) = if !solution.converged {
            (false, solution.message)
        } else if !in_bounds {
            (false, "Weights outside [0, 1] beyond tolerance".to_string())
        } else if sum_error > SUM_TOLERANCE {
            (false, format!("Weights sum to 1 only within {sum_error:.3e}"))
        } else if target_residual > target_tolerance {
            (false, format!("{target} missed by {target_residual:.3e}"))
        } else {
            (true, solution.message)
        };

        Ok(OptimizationOutcome {
            target,
            weights,
            metrics,
            success,
            message,
            iterations: solution.iterations,
        })
    }
}

impl fmt::Debug for PortfolioOptimizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortfolioOptimizer")
            .field("assets", &self.universe.len())
            .field("solver", &self.solver.name())
            .finish_non_exhaustive()
    }
}
