//! Portfolio metrics.
//!
//! Expected return, volatility and a heuristic maximum drawdown for a weight
//! vector. The weights are not required to sum to one.

use frontier_math::linear_algebra::{dot, quadratic_form};
use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};
use crate::universe::AssetUniverse;

/// Multiplier applied to volatility to estimate maximum drawdown.
///
/// An empirical rule of thumb, not a statistically derived figure. Override
/// it through [`EngineConfig::drawdown_multiplier`](crate::config::EngineConfig).
pub const DEFAULT_DRAWDOWN_MULTIPLIER: f64 = 2.5;

/// Return and risk figures of a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    /// `w · μ`.
    pub expected_return: f64,
    /// `sqrt(wᵀ Σ w)`.
    pub volatility: f64,
    /// `volatility × drawdown multiplier`.
    pub max_drawdown: f64,
}

fn check_len(universe: &AssetUniverse, weights: &[f64]) -> PortfolioResult<()> {
    if weights.len() == universe.len() {
        Ok(())
    } else {
        Err(PortfolioError::invalid_weights(universe.len(), weights.len()))
    }
}

/// Expected return `w · μ`.
pub fn portfolio_return(universe: &AssetUniverse, weights: &[f64]) -> PortfolioResult<f64> {
    check_len(universe, weights)?;
    Ok(dot(weights, universe.expected_returns()))
}

/// Variance `wᵀ Σ w`, clamped at zero.
pub fn portfolio_variance(universe: &AssetUniverse, weights: &[f64]) -> PortfolioResult<f64> {
    check_len(universe, weights)?;
    Ok(quadratic_form(universe.covariance(), weights).max(0.0))
}

/// All three metrics for `weights`.
///
/// # Errors
///
/// Returns [`PortfolioError::InvalidWeights`] if `weights` does not have one
/// entry per asset.
pub fn portfolio_metrics(
    universe: &AssetUniverse,
    weights: &[f64],
    drawdown_multiplier: f64,
) -> PortfolioResult<PortfolioMetrics> {
    let expected_return = portfolio_return(universe, weights)?;
    let volatility = portfolio_variance(universe, weights)?.sqrt();
    Ok(PortfolioMetrics {
        expected_return,
        volatility,
        max_drawdown: volatility * drawdown_multiplier,
    })
}
