//! Risk score to frontier mapping.
//!
//! A score `s` in `[1, 10]` selects frontier point
//! `floor((s - 1) / 9 × (len - 1))`, so score 1 is the lowest-return point
//! and score 10 the highest-return point that was retained.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{PortfolioError, PortfolioResult};
use crate::frontier::Frontier;
use crate::metrics::{portfolio_metrics, PortfolioMetrics};
use crate::universe::AssetUniverse;

/// A validated risk tolerance score in `[1, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RiskScore(f64);

impl RiskScore {
    /// Lowest score (most conservative).
    pub const MIN: f64 = 1.0;
    /// Highest score (most aggressive).
    pub const MAX: f64 = 10.0;

    /// Validates a score.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidRiskScore`] for non-finite values
    /// or values outside `[1, 10]`.
    pub fn new(value: f64) -> PortfolioResult<Self> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PortfolioError::InvalidRiskScore { value })
        }
    }

    /// Clamps a finite value into `[1, 10]`.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidRiskScore`] for NaN or infinities.
    pub fn clamped(value: f64) -> PortfolioResult<Self> {
        if value.is_finite() {
            Ok(Self(value.clamp(Self::MIN, Self::MAX)))
        } else {
            Err(PortfolioError::InvalidRiskScore { value })
        }
    }

    /// The raw score.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// The score rescaled to `[0, 1]`.
    #[must_use]
    pub fn normalized(self) -> f64 {
        (self.0 - Self::MIN) / (Self::MAX - Self::MIN)
    }
}

impl TryFrom<f64> for RiskScore {
    type Error = PortfolioError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RiskScore> for f64 {
    fn from(score: RiskScore) -> Self {
        score.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frontier index for `score` on a frontier of `len` points.
///
/// Returns `None` for an empty frontier.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn frontier_index(score: RiskScore, len: usize) -> Option<usize> {
    let last = len.checked_sub(1)?;
    let index = (score.normalized() * last as f64).floor().max(0.0) as usize;
    Some(index.min(last))
}

/// Zeroes weights below `threshold` and rescales the rest to sum to 1.
///
/// The rescale always happens, so the result sums to 1 within round-off
/// (a few ulps, not bit-exact) even when nothing was zeroed. If every weight is below the threshold the original weights
/// are rescaled instead. A vector summing to zero is returned unchanged.
#[must_use]
pub fn clean_weights(weights: &[f64], threshold: f64) -> Vec<f64> {
    let kept: Vec<f64> = weights
        .iter()
        .map(|&w| if w < threshold { 0.0 } else { w })
        .collect();
    let kept_sum: f64 = kept.iter().sum();
    if kept_sum > 0.0 {
        return kept.iter().map(|w| w / kept_sum).collect();
    }

    let raw_sum: f64 = weights.iter().sum();
    if raw_sum > 0.0 {
        weights.iter().map(|w| w / raw_sum).collect()
    } else {
        weights.to_vec()
    }
}

/// The portfolio chosen for a risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPortfolio {
    /// Cleaned weights, summing to 1.
    pub weights: Vec<f64>,
    /// Metrics of the frontier point as optimized (before cleaning).
    pub metrics: PortfolioMetrics,
    /// Score the selection was made for.
    pub risk_score: RiskScore,
    /// Index into the frontier; `None` for the equal-weight fallback.
    pub frontier_index: Option<usize>,
    /// True when the frontier was empty and equal weights were used.
    pub fallback: bool,
}

/// Selects frontier points for risk scores.
#[derive(Debug, Clone, Copy)]
pub struct RiskMapper<'a> {
    universe: &'a AssetUniverse,
    config: &'a EngineConfig,
}

impl<'a> RiskMapper<'a> {
    /// Creates a mapper.
    #[must_use]
    pub fn new(universe: &'a AssetUniverse, config: &'a EngineConfig) -> Self {
        Self { universe, config }
    }

    /// Picks the portfolio for `score`.
    ///
    /// An empty frontier yields the equal-weight portfolio with
    /// `fallback = true`.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidWeights`] if the frontier was built
    /// for a different universe.
    pub fn select(&self, score: RiskScore, frontier: &Frontier) -> PortfolioResult<SelectedPortfolio> {
        let Some(index) = frontier_index(score, frontier.len()) else {
            tracing::warn!(risk_score = %score, "efficient frontier is empty; using equal weights");
            let weights = self.universe.equal_weights();
            let metrics = portfolio_metrics(self.universe, &weights, self.config.drawdown_multiplier)?;
            return Ok(SelectedPortfolio {
                weights,
                metrics,
                risk_score: score,
                frontier_index: None,
                fallback: true,
            });
        };

        let point = &frontier.points[index];
        if point.weights.len() != self.universe.len() {
            return Err(PortfolioError::invalid_weights(
                self.universe.len(),
                point.weights.len(),
            ));
        }

        tracing::info!(
            risk_score = %score,
            index,
            expected_return = point.metrics.expected_return,
            volatility = point.metrics.volatility,
            "selected frontier portfolio"
        );
        Ok(SelectedPortfolio {
            weights: clean_weights(&point.weights, self.config.weight_threshold),
            metrics: point.metrics,
            risk_score: score,
            frontier_index: Some(index),
            fallback: false,
        })
    }
}
