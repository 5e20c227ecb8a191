//! Allocation plans.
//!
//! Turns a selected weight vector and an investment amount into named
//! entries. Amounts are plain numbers; currency symbols and grouping belong
//! to the presentation layer.

use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};
use crate::risk::{RiskScore, SelectedPortfolio};
use crate::universe::AssetUniverse;

/// One asset in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Asset name.
    pub asset: String,
    /// Weight as a fraction.
    pub weight: f64,
    /// Weight in percent (`weight × 100`).
    pub weight_pct: f64,
    /// `weight × total_amount`.
    pub amount: f64,
}

/// A displayable allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Entries above the weight threshold, largest weight first.
    pub entries: Vec<AllocationEntry>,
    /// Expected return of the selected portfolio.
    pub expected_return: f64,
    /// Volatility of the selected portfolio.
    pub volatility: f64,
    /// Heuristic maximum drawdown of the selected portfolio.
    pub max_drawdown: f64,
    /// Score the portfolio was selected for.
    pub risk_score: RiskScore,
    /// Amount to invest.
    pub total_amount: f64,
}

impl AllocationPlan {
    /// Builds a plan.
    ///
    /// Assets with weight at or below `threshold` are left out. Entries are
    /// sorted by descending weight; equal weights keep universe order.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidAmount`] unless `amount` is finite
    /// and positive, and [`PortfolioError::InvalidWeights`] if the weights
    /// do not match the universe.
    pub fn build(
        universe: &AssetUniverse,
        selected: &SelectedPortfolio,
        amount: f64,
        threshold: f64,
    ) -> PortfolioResult<Self> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(PortfolioError::InvalidAmount { value: amount });
        }
        if selected.weights.len() != universe.len() {
            return Err(PortfolioError::invalid_weights(
                universe.len(),
                selected.weights.len(),
            ));
        }

        let mut entries: Vec<AllocationEntry> = universe
            .assets()
            .iter()
            .zip(&selected.weights)
            .filter(|(_, weight)| **weight > threshold)
            .map(|(asset, &weight)| AllocationEntry {
                asset: asset.name.clone(),
                weight,
                weight_pct: weight * 100.0,
                amount: weight * amount,
            })
            .collect();
        entries.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        Ok(Self {
            entries,
            expected_return: selected.metrics.expected_return,
            volatility: selected.metrics.volatility,
            max_drawdown: selected.metrics.max_drawdown,
            risk_score: selected.risk_score,
            total_amount: amount,
        })
    }

    /// Sum of entry amounts.
    #[must_use]
    pub fn allocated_amount(&self) -> f64 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no asset passed the threshold.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
