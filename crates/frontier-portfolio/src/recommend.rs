//! End-to-end recommendation: risk score and amount in, allocation plan out.

use serde::{Deserialize, Serialize};

use crate::allocation::AllocationPlan;
use crate::config::EngineConfig;
use crate::error::{PortfolioError, PortfolioResult};
use crate::frontier::{Frontier, FrontierBuilder};
use crate::risk::{RiskMapper, RiskScore, SelectedPortfolio};
use crate::universe::AssetUniverse;

/// Shape of the frontier a recommendation was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierSummary {
    /// Grid points requested.
    pub requested: usize,
    /// Points retained.
    pub retained: usize,
    /// Points skipped after failed solves.
    pub skipped: usize,
    /// Realized expected return of the first and last retained points.
    pub return_range: Option<(f64, f64)>,
    /// Frontier index that was selected; `None` for the fallback portfolio.
    pub selected_index: Option<usize>,
}

impl FrontierSummary {
    fn new(frontier: &Frontier, selected: &SelectedPortfolio) -> Self {
        Self {
            requested: frontier.requested,
            retained: frontier.len(),
            skipped: frontier.skipped,
            return_range: frontier.return_range(),
            selected_index: selected.frontier_index,
        }
    }
}

/// A complete recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// The allocation to present.
    pub plan: AllocationPlan,
    /// The frontier it came from.
    pub frontier: FrontierSummary,
    /// Whether the equal-weight fallback was used.
    pub fallback: bool,
}

/// Owns a universe and configuration and answers recommendation requests.
#[derive(Debug, Clone)]
pub struct Advisor {
    universe: AssetUniverse,
    config: EngineConfig,
}

impl Advisor {
    /// Creates an advisor.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::Config`] if `config` does not validate.
    pub fn new(universe: AssetUniverse, config: EngineConfig) -> PortfolioResult<Self> {
        config.validate()?;
        Ok(Self { universe, config })
    }

    /// The universe recommendations are drawn from.
    #[must_use]
    pub fn universe(&self) -> &AssetUniverse {
        &self.universe
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the frontier with the configured grid size.
    #[must_use]
    pub fn frontier(&self) -> Frontier {
        FrontierBuilder::new(&self.universe, &self.config).build_default()
    }

    /// Recommends an allocation of `amount` for `risk_score`.
    ///
    /// Inputs are validated before any optimization runs.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidRiskScore`] for scores outside
    /// `[1, 10]` and [`PortfolioError::InvalidAmount`] for non-positive
    /// amounts.
    pub fn recommend(&self, risk_score: f64, amount: f64) -> PortfolioResult<Recommendation> {
        let score = RiskScore::new(risk_score)?;
        if !(amount.is_finite() && amount > 0.0) {
            return Err(PortfolioError::InvalidAmount { value: amount });
        }
        let frontier = self.frontier();
        self.recommend_from(score, amount, &frontier)
    }

    /// Recommends from an already built frontier.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidAmount`] for non-positive amounts and
    /// [`PortfolioError::InvalidWeights`] if `frontier` was built for a
    /// different universe.
    pub fn recommend_from(
        &self,
        score: RiskScore,
        amount: f64,
        frontier: &Frontier,
    ) -> PortfolioResult<Recommendation> {
        let selected = RiskMapper::new(&self.universe, &self.config).select(score, frontier)?;
        let plan = AllocationPlan::build(
            &self.universe,
            &selected,
            amount,
            self.config.weight_threshold,
        )?;
        tracing::info!(
            risk_score = %score,
            entries = plan.len(),
            expected_return = plan.expected_return,
            volatility = plan.volatility,
            "recommendation ready"
        );
        Ok(Recommendation {
            frontier: FrontierSummary::new(frontier, &selected),
            fallback: selected.fallback,
            plan,
        })
    }
}
