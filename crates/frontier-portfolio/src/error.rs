//! Error types for portfolio construction.
//!
//! Only caller and configuration mistakes are errors. A solver that stops
//! short of its tolerances is reported through
//! [`OptimizationOutcome::success`](crate::optimizer::OptimizationOutcome)
//! instead.

use frontier_math::MathError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Errors that can occur during portfolio operations.
#[derive(Error, Debug, Clone)]
pub enum PortfolioError {
    /// Malformed asset statistics table.
    #[error("Invalid asset universe: {reason}")]
    InvalidUniverse {
        /// The reason the universe was rejected.
        reason: String,
    },

    /// Risk score outside `[1, 10]` or not a number.
    #[error("Invalid risk score {value}: expected a finite value in [1, 10]")]
    InvalidRiskScore {
        /// The rejected score.
        value: f64,
    },

    /// Investment amount that is not a positive finite number.
    #[error("Invalid investment amount {value}: expected a positive finite value")]
    InvalidAmount {
        /// The rejected amount.
        value: f64,
    },

    /// Weight vector whose length does not match the universe.
    #[error("Weight vector has {actual} entries, universe has {expected} assets")]
    InvalidWeights {
        /// Number of assets in the universe.
        expected: usize,
        /// Number of weights supplied.
        actual: usize,
    },

    /// Optimization target that is not a finite number.
    #[error("Invalid optimization target: {reason}")]
    InvalidTarget {
        /// The reason the target was rejected.
        reason: String,
    },

    /// Both a risk target and a return target were supplied.
    #[error("target_risk and target_return are mutually exclusive")]
    ConflictingTargets,

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {reason}")]
    Config {
        /// The reason loading failed.
        reason: String,
    },

    /// Numerical failure in the math layer.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl PortfolioError {
    /// Create an invalid universe error.
    #[must_use]
    pub fn invalid_universe(reason: impl Into<String>) -> Self {
        Self::InvalidUniverse {
            reason: reason.into(),
        }
    }

    /// Create an invalid weights error.
    #[must_use]
    pub fn invalid_weights(expected: usize, actual: usize) -> Self {
        Self::InvalidWeights { expected, actual }
    }

    /// Create an invalid target error.
    #[must_use]
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
