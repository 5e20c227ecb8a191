//! The asset statistics table.
//!
//! An [`AssetUniverse`] holds the expected return of every asset and the
//! covariance matrix of their returns. It is validated once at construction
//! and immutable afterwards, so it can be shared freely between threads and
//! between independent optimizations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};

/// Absolute tolerance for `|Σ[i][j] - Σ[j][i]|`.
pub const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// An investable asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Display name, unique within a universe.
    pub name: String,
    /// Annualized expected return as a fraction (0.085 = 8.5%).
    pub expected_return: f64,
}

impl Asset {
    /// Creates an asset.
    #[must_use]
    pub fn new(name: impl Into<String>, expected_return: f64) -> Self {
        Self {
            name: name.into(),
            expected_return,
        }
    }
}

/// Expected returns and covariance for a fixed set of assets.
///
/// Row and column `i` of the covariance matrix belong to `assets()[i]`.
/// Positive semi-definiteness is not verified; an indefinite matrix shows up
/// as a solver failure rather than a construction error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetUniverse {
    assets: Vec<Asset>,
    covariance: Vec<Vec<f64>>,
    #[serde(skip)]
    returns: Vec<f64>,
}

impl AssetUniverse {
    /// Validates and builds a universe.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidUniverse`] when there are no assets,
    /// the covariance matrix is not `N x N`, any value is non-finite, a
    /// variance is negative, the matrix is asymmetric, or asset names are
    /// empty or repeated.
    pub fn new(assets: Vec<Asset>, covariance: Vec<Vec<f64>>) -> PortfolioResult<Self> {
        let n = assets.len();
        if n == 0 {
            return Err(PortfolioError::invalid_universe("universe has no assets"));
        }

        let mut seen = HashSet::with_capacity(n);
        for asset in &assets {
            if asset.name.trim().is_empty() {
                return Err(PortfolioError::invalid_universe("asset name is empty"));
            }
            if !seen.insert(asset.name.as_str()) {
                return Err(PortfolioError::invalid_universe(format!(
                    "duplicate asset name '{}'",
                    asset.name
                )));
            }
            if !asset.expected_return.is_finite() {
                return Err(PortfolioError::invalid_universe(format!(
                    "expected return of '{}' is not finite",
                    asset.name
                )));
            }
        }

        if covariance.len() != n {
            return Err(PortfolioError::invalid_universe(format!(
                "covariance has {} rows for {n} assets",
                covariance.len()
            )));
        }
        for (i, row) in covariance.iter().enumerate() {
            if row.len() != n {
                return Err(PortfolioError::invalid_universe(format!(
                    "covariance row {i} has {} columns for {n} assets",
                    row.len()
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(PortfolioError::invalid_universe(format!(
                    "covariance entry ({i}, {j}) is not finite"
                )));
            }
        }

        for i in 0..n {
            if covariance[i][i] < 0.0 {
                return Err(PortfolioError::invalid_universe(format!(
                    "variance of '{}' is negative ({})",
                    assets[i].name, covariance[i][i]
                )));
            }
            for j in (i + 1)..n {
                if (covariance[i][j] - covariance[j][i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(PortfolioError::invalid_universe(format!(
                        "covariance is not symmetric at ({i}, {j}): {} vs {}",
                        covariance[i][j], covariance[j][i]
                    )));
                }
            }
        }

        let universe = Self::from_validated(assets, covariance);
        tracing::debug!(
            assets = universe.len(),
            min_return = universe.min_return(),
            max_return = universe.max_return(),
            "asset universe constructed"
        );
        Ok(universe)
    }

    fn from_validated(assets: Vec<Asset>, covariance: Vec<Vec<f64>>) -> Self {
        let returns = assets.iter().map(|a| a.expected_return).collect();
        Self {
            assets,
            covariance,
            returns,
        }
    }

    /// The built-in ten-fund table.
    ///
    /// Ranges from a money market fund (2.5% expected return, 2.8%
    /// volatility) to an aggressive growth fund (18.5%, 16%).
    #[must_use]
    pub fn sample_funds() -> Self {
        let assets = SAMPLE_FUND_NAMES
            .iter()
            .zip(SAMPLE_FUND_RETURNS)
            .map(|(name, r)| Asset::new(*name, r))
            .collect();
        let covariance = SAMPLE_FUND_COVARIANCE.iter().map(|row| row.to_vec()).collect();
        Self::from_validated(assets, covariance)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Always `false` for a constructed universe.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// The assets in table order.
    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Asset at `index`.
    #[must_use]
    pub fn asset(&self, index: usize) -> Option<&Asset> {
        self.assets.get(index)
    }

    /// Asset names in table order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.name.as_str()).collect()
    }

    /// Position of the asset called `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.assets.iter().position(|a| a.name == name)
    }

    /// Expected returns in table order.
    #[must_use]
    pub fn expected_returns(&self) -> &[f64] {
        &self.returns
    }

    /// Covariance matrix rows.
    #[must_use]
    pub fn covariance(&self) -> &[Vec<f64>] {
        &self.covariance
    }

    /// Standalone volatility of asset `index`.
    #[must_use]
    pub fn asset_volatility(&self, index: usize) -> Option<f64> {
        self.covariance.get(index).map(|row| row[index].max(0.0).sqrt())
    }

    /// Index and return of the highest-return asset (first one on ties).
    #[must_use]
    pub fn max_return_asset(&self) -> (usize, f64) {
        self.returns
            .iter()
            .enumerate()
            .fold((0, self.returns[0]), |best, (i, &r)| {
                if r > best.1 {
                    (i, r)
                } else {
                    best
                }
            })
    }

    /// Index and return of the lowest-return asset (first one on ties).
    #[must_use]
    pub fn min_return_asset(&self) -> (usize, f64) {
        self.returns
            .iter()
            .enumerate()
            .fold((0, self.returns[0]), |best, (i, &r)| {
                if r < best.1 {
                    (i, r)
                } else {
                    best
                }
            })
    }

    /// Highest single-asset expected return.
    #[must_use]
    pub fn max_return(&self) -> f64 {
        self.max_return_asset().1
    }

    /// Lowest single-asset expected return.
    #[must_use]
    pub fn min_return(&self) -> f64 {
        self.min_return_asset().1
    }

    /// `1/N` for every asset.
    #[must_use]
    pub fn equal_weights(&self) -> Vec<f64> {
        let n = self.len();
        vec![1.0 / n as f64; n]
    }

    /// A portfolio fully invested in asset `index`.
    #[must_use]
    pub fn single_asset_weights(&self, index: usize) -> Vec<f64> {
        let mut weights = vec![0.0; self.len()];
        if let Some(w) = weights.get_mut(index) {
            *w = 1.0;
        }
        weights
    }
}

const SAMPLE_FUND_NAMES: [&str; 10] = [
    "A Money Market",
    "B Bond",
    "C Hybrid",
    "D Equity",
    "E Index",
    "F QDII",
    "G REITs",
    "H Commodity",
    "I Stable Income",
    "J Growth Select",
];

const SAMPLE_FUND_RETURNS: [f64; 10] = [
    0.025, 0.045, 0.085, 0.155, 0.125, 0.105, 0.095, 0.135, 0.035, 0.185,
];

#[rustfmt::skip]
const SAMPLE_FUND_COVARIANCE: [[f64; 10]; 10] = [
    [0.0008, 0.0003, 0.0001, 0.0000, 0.0001, 0.0001, 0.0001, 0.0000, 0.0006, 0.0000],
    [0.0003, 0.0015, 0.0005, 0.0001, 0.0003, 0.0002, 0.0002, 0.0001, 0.0008, 0.0001],
    [0.0001, 0.0005, 0.0040, 0.0025, 0.0030, 0.0020, 0.0018, 0.0022, 0.0003, 0.0028],
    [0.0000, 0.0001, 0.0025, 0.0225, 0.0150, 0.0100, 0.0080, 0.0120, 0.0001, 0.0180],
    [0.0001, 0.0003, 0.0030, 0.0150, 0.0144, 0.0085, 0.0075, 0.0095, 0.0002, 0.0120],
    [0.0001, 0.0002, 0.0020, 0.0100, 0.0085, 0.0090, 0.0065, 0.0078, 0.0001, 0.0085],
    [0.0001, 0.0002, 0.0018, 0.0080, 0.0075, 0.0065, 0.0064, 0.0055, 0.0002, 0.0070],
    [0.0000, 0.0001, 0.0022, 0.0120, 0.0095, 0.0078, 0.0055, 0.0169, 0.0001, 0.0105],
    [0.0006, 0.0008, 0.0003, 0.0001, 0.0002, 0.0001, 0.0002, 0.0001, 0.0012, 0.0001],
    [0.0000, 0.0001, 0.0028, 0.0180, 0.0120, 0.0085, 0.0070, 0.0105, 0.0001, 0.0256],
];
