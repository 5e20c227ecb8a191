//! # Frontier Portfolio
//!
//! Mean-variance portfolio optimization over a fixed asset universe.
//!
//! Given expected returns and a covariance matrix, this crate computes
//! minimum-variance and target-return allocations, samples the efficient
//! frontier, maps a 1-10 risk score onto one frontier portfolio and turns it
//! into an allocation plan for a cash amount.
//!
//! ## Design Philosophy
//!
//! - **Explicit inputs**: The universe is an immutable value passed in, not global state
//! - **Deterministic**: Every solve starts from equal weights; no warm starts or caches
//! - **Graceful degradation**: Failed frontier points are skipped; an empty
//!   frontier falls back to equal weights
//! - **Strict boundaries**: Bad risk scores, amounts and tables are rejected up front
//!
//! ## Quick Start
//!
//! ```rust
//! use frontier_portfolio::prelude::*;
//!
//! let universe = AssetUniverse::sample_funds();
//! let config = EngineConfig::default().with_frontier_points(20);
//!
//! let frontier = FrontierBuilder::new(&universe, &config).build_default();
//! let score = RiskScore::new(6.0)?;
//! let selected = RiskMapper::new(&universe, &config).select(score, &frontier)?;
//! let plan = AllocationPlan::build(&universe, &selected, 100_000.0, config.weight_threshold)?;
//!
//! assert!((plan.allocated_amount() - 100_000.0).abs() < 1e-6);
//! # Ok::<(), frontier_portfolio::PortfolioError>(())
//! ```
//!
//! ## Module Overview
//!
//! - [`universe`] - Asset statistics table
//! - [`metrics`] - Return, volatility and drawdown estimate
//! - [`optimizer`] - Constrained optimizer
//! - [`frontier`] - Efficient frontier builder
//! - [`risk`] - Risk score mapping and weight cleaning
//! - [`allocation`] - Allocation plans
//! - [`recommend`] - The full pipeline behind one call
//! - [`config`] - Engine configuration and universe files
//!
//! ## Feature Flags
//!
//! - `parallel`: Solve frontier grid points in parallel with rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod allocation;
pub mod config;
pub mod error;
pub mod frontier;
pub mod metrics;
pub mod optimizer;
pub mod parallel;
pub mod recommend;
pub mod risk;
pub mod universe;

pub use error::{PortfolioError, PortfolioResult};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::allocation::{AllocationEntry, AllocationPlan};
    pub use crate::config::{EngineConfig, UniverseFile};
    pub use crate::error::{PortfolioError, PortfolioResult};
    pub use crate::frontier::{target_return_grid, Frontier, FrontierBuilder, FrontierPoint};
    pub use crate::metrics::{
        portfolio_metrics, portfolio_return, portfolio_variance, PortfolioMetrics,
        DEFAULT_DRAWDOWN_MULTIPLIER,
    };
    pub use crate::optimizer::{OptimizationOutcome, OptimizationTarget, PortfolioOptimizer};
    pub use crate::recommend::{Advisor, FrontierSummary, Recommendation};
    pub use crate::risk::{clean_weights, frontier_index, RiskMapper, RiskScore, SelectedPortfolio};
    pub use crate::universe::{Asset, AssetUniverse};
    pub use frontier_math::optimization::{QpConfig, SolverKind};
}
