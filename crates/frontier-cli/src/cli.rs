//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use frontier_portfolio::prelude::SolverKind;

use crate::commands::{BuildArgs, OptimizeArgs, RecommendArgs, UniverseArgs};

/// Frontier - Mean-variance portfolio optimization CLI
#[derive(Parser)]
#[command(name = "frontier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Universe file (.toml or .json). Defaults to the built-in ten-fund table.
    #[arg(short, long, global = true, env = "FRONTIER_UNIVERSE")]
    pub universe: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Quadratic program solver
    #[arg(long, value_enum, global = true)]
    pub solver: Option<SolverArg>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the asset statistics table
    Universe(UniverseArgs),

    /// Solve a single minimum-variance, target-return or target-risk problem
    Optimize(OptimizeArgs),

    /// Build and display the efficient frontier
    Build(BuildArgs),

    /// Recommend an allocation for a risk score and amount
    Recommend(RecommendArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// Minimal output (headline numbers only)
    Minimal,
}

/// Solver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SolverArg {
    /// Exact active-set method
    ActiveSet,
    /// First-order projected gradient
    ProjectedGradient,
}

impl From<SolverArg> for SolverKind {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::ActiveSet => SolverKind::ActiveSet,
            SolverArg::ProjectedGradient => SolverKind::ProjectedGradient,
        }
    }
}
