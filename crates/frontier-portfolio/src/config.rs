//! Engine configuration and universe files.
//!
//! [`EngineConfig`] carries the tunable constants of the pipeline.
//! [`UniverseFile`] reads an asset universe, and optionally an `[engine]`
//! override table, from TOML or JSON:
//!
//! ```toml
//! covariance = [
//!     [0.0100, 0.0020],
//!     [0.0020, 0.0400],
//! ]
//!
//! [[assets]]
//! name = "Bonds"
//! expected_return = 0.04
//!
//! [[assets]]
//! name = "Stocks"
//! expected_return = 0.09
//!
//! [engine]
//! frontier_points = 50
//! ```

use std::path::Path;

use frontier_math::optimization::{QpConfig, SolverKind};
use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};
use crate::metrics::DEFAULT_DRAWDOWN_MULTIPLIER;
use crate::universe::{Asset, AssetUniverse};

/// Default number of frontier grid points.
pub const DEFAULT_FRONTIER_POINTS: usize = 100;

/// Default threshold below which a weight is treated as noise.
pub const DEFAULT_WEIGHT_THRESHOLD: f64 = 0.001;

/// Default fraction of the top asset return used as the frontier's upper end.
pub const DEFAULT_UPPER_RETURN_FRACTION: f64 = 0.9;

/// Tunable constants of the optimization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Grid size used by [`FrontierBuilder::build_default`](crate::frontier::FrontierBuilder::build_default).
    pub frontier_points: usize,

    /// Weights below this are zeroed by the risk mapper; weights at or below
    /// it are left out of allocation plans.
    pub weight_threshold: f64,

    /// Volatility multiplier for the maximum drawdown estimate.
    pub drawdown_multiplier: f64,

    /// Upper end of the frontier as a fraction of the highest asset return.
    pub upper_return_fraction: f64,

    /// Warn when a frontier retains fewer points than this (0 disables).
    pub min_frontier_points: usize,

    /// Quadratic-programming strategy.
    pub solver: SolverKind,

    /// Solver tolerances and limits.
    pub qp: QpConfig,

    /// Solve frontier points in parallel (requires the `parallel` feature).
    pub parallel: bool,

    /// Minimum grid size before parallel solving is used.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frontier_points: DEFAULT_FRONTIER_POINTS,
            weight_threshold: DEFAULT_WEIGHT_THRESHOLD,
            drawdown_multiplier: DEFAULT_DRAWDOWN_MULTIPLIER,
            upper_return_fraction: DEFAULT_UPPER_RETURN_FRACTION,
            min_frontier_points: 0,
            solver: SolverKind::default(),
            qp: QpConfig::default(),
            parallel: true,
            parallel_threshold: 16,
        }
    }
}

impl EngineConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default frontier grid size.
    #[must_use]
    pub fn with_frontier_points(mut self, points: usize) -> Self {
        self.frontier_points = points;
        self
    }

    /// Sets the small-weight threshold.
    #[must_use]
    pub fn with_weight_threshold(mut self, threshold: f64) -> Self {
        self.weight_threshold = threshold;
        self
    }

    /// Sets the drawdown multiplier.
    #[must_use]
    pub fn with_drawdown_multiplier(mut self, multiplier: f64) -> Self {
        self.drawdown_multiplier = multiplier;
        self
    }

    /// Sets the upper return fraction.
    #[must_use]
    pub fn with_upper_return_fraction(mut self, fraction: f64) -> Self {
        self.upper_return_fraction = fraction;
        self
    }

    /// Sets the sparse-frontier warning threshold.
    #[must_use]
    pub fn with_min_frontier_points(mut self, points: usize) -> Self {
        self.min_frontier_points = points;
        self
    }

    /// Sets the solver strategy.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the solver tolerances.
    #[must_use]
    pub fn with_qp(mut self, qp: QpConfig) -> Self {
        self.qp = qp;
        self
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Returns true if parallel processing should be used for `count` items.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::Config`] naming the first bad field.
    pub fn validate(&self) -> PortfolioResult<()> {
        if !(self.weight_threshold.is_finite() && (0.0..1.0).contains(&self.weight_threshold)) {
            return Err(PortfolioError::config(format!(
                "weight_threshold must be in [0, 1), got {}",
                self.weight_threshold
            )));
        }
        if !(self.drawdown_multiplier.is_finite() && self.drawdown_multiplier >= 0.0) {
            return Err(PortfolioError::config(format!(
                "drawdown_multiplier must be non-negative, got {}",
                self.drawdown_multiplier
            )));
        }
        if !(self.upper_return_fraction.is_finite() && self.upper_return_fraction > 0.0) {
            return Err(PortfolioError::config(format!(
                "upper_return_fraction must be positive, got {}",
                self.upper_return_fraction
            )));
        }
        let qp = &self.qp;
        if !(qp.tolerance > 0.0 && qp.feasibility_tolerance > 0.0) {
            return Err(PortfolioError::config("solver tolerances must be positive"));
        }
        Ok(())
    }
}

/// On-disk form of an asset universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UniverseFile {
    /// Covariance rows in the same order as `assets`.
    pub covariance: Vec<Vec<f64>>,
    /// Assets in table order.
    pub assets: Vec<Asset>,
    /// Optional engine overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfig>,
}

impl UniverseFile {
    /// Parses TOML text.
    pub fn from_toml_str(text: &str) -> PortfolioResult<Self> {
        toml::from_str(text).map_err(|e| PortfolioError::config(format!("invalid TOML: {e}")))
    }

    /// Parses JSON text.
    pub fn from_json_str(text: &str) -> PortfolioResult<Self> {
        serde_json::from_str(text).map_err(|e| PortfolioError::config(format!("invalid JSON: {e}")))
    }

    /// Reads a file, choosing the format from its extension
    /// (`.json` is JSON, anything else is TOML).
    pub fn load(path: impl AsRef<Path>) -> PortfolioResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PortfolioError::config(format!("cannot read {}: {e}", path.display())))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        tracing::info!(path = %path.display(), assets = file.assets.len(), "loaded universe file");
        Ok(file)
    }

    /// The sample universe in file form.
    #[must_use]
    pub fn sample() -> Self {
        let universe = AssetUniverse::sample_funds();
        Self {
            covariance: universe.covariance().to_vec(),
            assets: universe.assets().to_vec(),
            engine: None,
        }
    }

    /// Validates the table and the engine overrides.
    ///
    /// Returns the universe together with the engine config (defaults when
    /// the file has no `[engine]` table).
    pub fn into_parts(self) -> PortfolioResult<(AssetUniverse, EngineConfig)> {
        let config = self.engine.unwrap_or_default();
        config.validate()?;
        let universe = AssetUniverse::new(self.assets, self.covariance)?;
        Ok((universe, config))
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> PortfolioResult<String> {
        toml::to_string_pretty(self).map_err(|e| PortfolioError::config(e.to_string()))
    }
}
