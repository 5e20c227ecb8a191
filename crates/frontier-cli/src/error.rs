//! CLI error types.

use frontier_portfolio::PortfolioError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid risk score.
    #[error("Invalid risk score: {0}. Must be between 1 and 10.")]
    InvalidRiskScore(f64),

    /// Invalid investment amount.
    #[error("Invalid amount: {0}. Must be positive.")]
    InvalidAmount(f64),

    /// Invalid frontier size.
    #[error("Invalid number of frontier points: {0}. Must be at least 1.")]
    InvalidPoints(usize),

    /// Universe file could not be loaded.
    #[error("Universe error: {0}")]
    Universe(String),

    /// Engine error.
    #[error(transparent)]
    Engine(#[from] PortfolioError),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
