//! Efficient frontier construction.
//!
//! The frontier is sampled on an evenly spaced grid of target returns, from
//! the return of the global minimum-variance portfolio up to a fraction
//! (default 90%) of the highest single-asset return. Stopping short of the
//! top asset avoids the all-in-one-asset corner, where the return condition
//! pins every weight.
//!
//! Grid points whose solve fails are skipped. A frontier with gaps, or no
//! points at all, is a valid result; the [`RiskMapper`](crate::risk::RiskMapper)
//! handles the empty case.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::metrics::PortfolioMetrics;
use crate::optimizer::{OptimizationTarget, PortfolioOptimizer};
use crate::parallel::maybe_parallel_map;
use crate::universe::AssetUniverse;

/// Grid points between progress log lines.
const PROGRESS_INTERVAL: usize = 20;

/// One optimized portfolio on the frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Return requested from the optimizer.
    pub target_return: f64,
    /// Optimized weights.
    pub weights: Vec<f64>,
    /// Metrics of `weights`; `expected_return` matches `target_return`
    /// within solver tolerance.
    pub metrics: PortfolioMetrics,
}

/// Frontier points in grid order (ascending target return).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frontier {
    /// Retained points.
    pub points: Vec<FrontierPoint>,
    /// Grid size that was requested.
    pub requested: usize,
    /// Grid points dropped because their solve failed.
    pub skipped: usize,
}

impl Frontier {
    /// A frontier with no usable points.
    #[must_use]
    pub fn empty(requested: usize) -> Self {
        Self {
            points: Vec::new(),
            requested,
            skipped: requested,
        }
    }

    /// Number of retained points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when fewer than `min_points` points were retained.
    /// A threshold of zero never reports sparse.
    #[must_use]
    pub fn is_sparse(&self, min_points: usize) -> bool {
        self.len() < min_points
    }

    /// Lowest-return point.
    #[must_use]
    pub fn first(&self) -> Option<&FrontierPoint> {
        self.points.first()
    }

    /// Highest-return point.
    #[must_use]
    pub fn last(&self) -> Option<&FrontierPoint> {
        self.points.last()
    }

    /// Point at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FrontierPoint> {
        self.points.get(index)
    }

    /// Iterates over the retained points.
    pub fn iter(&self) -> std::slice::Iter<'_, FrontierPoint> {
        self.points.iter()
    }

    /// Smallest and largest realized expected return.
    #[must_use]
    pub fn return_range(&self) -> Option<(f64, f64)> {
        Some((
            self.first()?.metrics.expected_return,
            self.last()?.metrics.expected_return,
        ))
    }
}

impl<'a> IntoIterator for &'a Frontier {
    type Item = &'a FrontierPoint;
    type IntoIter = std::slice::Iter<'a, FrontierPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// `n` evenly spaced values from `start` to `end`, both included.
///
/// `n = 0` gives an empty grid and `n = 1` gives `[start]`.
#[must_use]
pub fn target_return_grid(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Builds efficient frontiers for one universe.
#[derive(Debug, Clone, Copy)]
pub struct FrontierBuilder<'a> {
    universe: &'a AssetUniverse,
    config: &'a EngineConfig,
}

impl<'a> FrontierBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub fn new(universe: &'a AssetUniverse, config: &'a EngineConfig) -> Self {
        Self { universe, config }
    }

    /// Builds a frontier with `config.frontier_points` grid points.
    #[must_use]
    pub fn build_default(&self) -> Frontier {
        self.build(self.config.frontier_points)
    }

    /// Builds a frontier with `num_points` grid points.
    ///
    /// Never fails: solver errors and non-converged grid points are logged
    /// and counted in [`Frontier::skipped`].
    #[must_use]
    pub fn build(&self, num_points: usize) -> Frontier {
        tracing::info!(num_points, solver = %self.config.solver, "building efficient frontier");
        let optimizer = PortfolioOptimizer::new(self.universe, self.config);

        let min_variance = match optimizer.optimize(OptimizationTarget::MinVariance) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "minimum-variance portfolio failed; frontier is empty");
                return Frontier::empty(num_points);
            }
        };
        if !min_variance.success {
            tracing::warn!(
                message = %min_variance.message,
                "minimum-variance portfolio not fully converged; using its return as the grid start"
            );
        }

        let start = min_variance.metrics.expected_return;
        let end = self.universe.max_return() * self.config.upper_return_fraction;
        let grid = target_return_grid(start, end, num_points);

        let solved = maybe_parallel_map(&grid, self.config, |i, &target_return| {
            if i % PROGRESS_INTERVAL == 0 {
                tracing::info!(point = i + 1, total = num_points, "frontier progress");
            }
            match optimizer.optimize(OptimizationTarget::Return(target_return)) {
                Ok(outcome) if outcome.success => Some(FrontierPoint {
                    target_return,
                    weights: outcome.weights,
                    metrics: outcome.metrics,
                }),
                Ok(outcome) => {
                    tracing::warn!(target_return, message = %outcome.message, "skipping frontier point");
                    None
                }
                Err(e) => {
                    tracing::warn!(target_return, error = %e, "skipping frontier point");
                    None
                }
            }
        });

        let points: Vec<FrontierPoint> = solved.into_iter().flatten().collect();
        let frontier = Frontier {
            skipped: num_points - points.len(),
            requested: num_points,
            points,
        };

        if frontier.is_sparse(self.config.min_frontier_points) {
            tracing::warn!(
                retained = frontier.len(),
                minimum = self.config.min_frontier_points,
                "efficient frontier is sparse"
            );
        }
        tracing::info!(
            retained = frontier.len(),
            skipped = frontier.skipped,
            "efficient frontier built"
        );
        frontier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::RETURN_TOLERANCE;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_edges() {
        assert!(target_return_grid(0.0, 1.0, 0).is_empty());
        assert_eq!(target_return_grid(0.03, 0.2, 1), vec![0.03]);
        assert_eq!(target_return_grid(0.0, 1.0, 2), vec![0.0, 1.0]);

        let grid = target_return_grid(0.0, 1.0, 5);
        assert_eq!(grid.len(), 5);
        assert_relative_eq!(grid[1], 0.25);
        assert_eq!(grid[4], 1.0);
    }

    #[test]
    fn test_grid_endpoint_exact() {
        let grid = target_return_grid(0.0281, 0.1665, 100);
        assert_eq!(grid[0], 0.0281);
        assert_eq!(grid[99], 0.1665);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_frontier_accessors() {
        let point = |r: f64| FrontierPoint {
            target_return: r,
            weights: vec![1.0],
            metrics: PortfolioMetrics {
                expected_return: r,
                volatility: r * 2.0,
                max_drawdown: r * 5.0,
            },
        };
        let frontier = Frontier {
            points: vec![point(0.02), point(0.05)],
            requested: 3,
            skipped: 1,
        };

        assert_eq!(frontier.len(), 2);
        assert!(!frontier.is_empty());
        assert!(frontier.is_sparse(3));
        assert!(!frontier.is_sparse(2));
        assert!(!frontier.is_sparse(0));
        assert_eq!(frontier.return_range(), Some((0.02, 0.05)));
        assert_eq!((&frontier).into_iter().count(), 2);

        let empty = Frontier::empty(10);
        assert!(empty.is_empty());
        assert_eq!(empty.skipped, 10);
        assert!(empty.return_range().is_none());
    }

    #[test]
    fn test_build_sample_frontier() {
        let universe = AssetUniverse::sample_funds();
        let config = EngineConfig::default();
        let frontier = FrontierBuilder::new(&universe, &config).build(25);

        assert_eq!(frontier.requested, 25);
        assert_eq!(frontier.len() + frontier.skipped, 25);
        assert!(frontier.len() >= 24, "retained {}", frontier.len());

        for point in &frontier {
            assert!((point.metrics.expected_return - point.target_return).abs() <= RETURN_TOLERANCE);
        }
        let last = frontier.last().unwrap();
        assert_relative_eq!(last.target_return, 0.185 * 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_points() {
        let universe = AssetUniverse::sample_funds();
        let config = EngineConfig::default();
        let frontier = FrontierBuilder::new(&universe, &config).build(0);
        assert!(frontier.is_empty());
        assert_eq!(frontier.skipped, 0);
    }

    #[test]
    fn test_single_point_is_min_variance() {
        let universe = AssetUniverse::sample_funds();
        let config = EngineConfig::default();
        let frontier = FrontierBuilder::new(&universe, &config).build(1);
        let min_variance = PortfolioOptimizer::new(&universe, &config)
            .optimize(OptimizationTarget::MinVariance)
            .unwrap();

        assert_eq!(frontier.len(), 1);
        assert_relative_eq!(
            frontier.points[0].metrics.volatility,
            min_variance.metrics.volatility,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_build_default_uses_config() {
        let universe = AssetUniverse::sample_funds();
        let config = EngineConfig::default().with_frontier_points(7);
        let frontier = FrontierBuilder::new(&universe, &config).build_default();
        assert_eq!(frontier.requested, 7);
    }
}
