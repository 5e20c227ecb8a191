//! CLI command implementations.

pub mod build;
pub mod optimize;
pub mod recommend;
pub mod universe;

// Re-export submodules for convenience
pub use build::BuildArgs;
pub use optimize::OptimizeArgs;
pub use recommend::RecommendArgs;
pub use universe::UniverseArgs;

use std::path::Path;

use frontier_portfolio::prelude::*;

use crate::cli::SolverArg;
use crate::error::{CliError, CliResult};

/// Universe and engine configuration shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub universe: AssetUniverse,
    pub config: EngineConfig,
}

impl Context {
    /// Loads the universe file, or the built-in table when no path is given.
    ///
    /// A `--solver` flag overrides the solver named in the file.
    pub fn load(path: Option<&Path>, solver: Option<SolverArg>) -> CliResult<Self> {
        let file = match path {
            Some(path) => UniverseFile::load(path)
                .map_err(|e| CliError::Universe(format!("{}: {e}", path.display())))?,
            None => UniverseFile::sample(),
        };
        let (universe, mut config) = file.into_parts()?;
        if let Some(solver) = solver {
            let solver = SolverKind::from(solver);
            if solver != config.solver {
                tracing::debug!(
                    configured = %config.solver,
                    selected = %solver,
                    "solver overridden by --solver"
                );
            }
            config = config.with_solver(solver);
        }
        tracing::debug!(
            assets = universe.len(),
            solver = %config.solver,
            frontier_points = config.frontier_points,
            "engine context ready"
        );
        Ok(Self { universe, config })
    }
}

/// Validates a risk score.
pub fn validate_risk_score(score: f64) -> CliResult<f64> {
    if !(RiskScore::MIN..=RiskScore::MAX).contains(&score) {
        return Err(CliError::InvalidRiskScore(score));
    }
    Ok(score)
}

/// Validates an investment amount.
pub fn validate_amount(amount: f64) -> CliResult<f64> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(CliError::InvalidAmount(amount));
    }
    Ok(amount)
}

/// Validates a frontier size.
pub fn validate_points(points: usize) -> CliResult<usize> {
    if points == 0 {
        return Err(CliError::InvalidPoints(points));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_risk_score() {
        assert!(validate_risk_score(1.0).is_ok());
        assert!(validate_risk_score(10.0).is_ok());
        assert!(validate_risk_score(0.5).is_err());
        assert!(validate_risk_score(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_default_context() {
        let context = Context::load(None, Some(SolverArg::ProjectedGradient)).unwrap();
        assert_eq!(context.universe.len(), 10);
        assert_eq!(context.config.solver, SolverKind::ProjectedGradient);
    }

    #[test]
    fn test_solver_flag_overrides_file() {
        let text = r#"
covariance = [[0.01, 0.0], [0.0, 0.04]]

[[assets]]
name = "Bonds"
expected_return = 0.04

[[assets]]
name = "Stocks"
expected_return = 0.10

[engine]
solver = "active-set"
"#;
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::io::Write::write_all(&mut file, text.as_bytes()).unwrap();

        let from_file = Context::load(Some(file.path()), None).unwrap();
        assert_eq!(from_file.config.solver, SolverKind::ActiveSet);
        assert_eq!(from_file.universe.len(), 2);

        let overridden =
            Context::load(Some(file.path()), Some(SolverArg::ProjectedGradient)).unwrap();
        assert_eq!(overridden.config.solver, SolverKind::ProjectedGradient);
        assert_eq!(overridden.universe, from_file.universe);
    }

    #[test]
    fn test_missing_universe_file() {
        let result = Context::load(Some(Path::new("/nonexistent/funds.toml")), None);
        assert!(matches!(result, Err(CliError::Universe(_))));
    }
}
