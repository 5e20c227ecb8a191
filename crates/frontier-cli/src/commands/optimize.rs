//! Optimize command implementation.
//!
//! Solves one minimum-variance, target-return or target-risk problem.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use frontier_portfolio::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::Context;
use crate::output::{
    display_percent, print_header, print_json, print_output, print_warning, KeyValue,
};

/// Arguments for the optimize command.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Target expected return as a fraction (e.g. 0.10 for 10%)
    #[arg(long)]
    pub target_return: Option<f64>,

    /// Target volatility as a fraction (e.g. 0.15 for 15%)
    #[arg(long)]
    pub target_risk: Option<f64>,

    /// Show assets whose weight is below the display threshold
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct WeightRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Weight", display_with = "display_percent")]
    weight: f64,
}

#[derive(Debug, Serialize)]
struct OptimizeReport<'a> {
    solver: &'static str,
    #[serde(flatten)]
    outcome: &'a OptimizationOutcome,
    assets: Vec<&'a str>,
}

/// Execute the optimize command.
pub fn execute(args: OptimizeArgs, context: &Context, format: OutputFormat) -> Result<()> {
    let target = OptimizationTarget::from_options(args.target_risk, args.target_return)?;
    let optimizer = PortfolioOptimizer::new(&context.universe, &context.config);
    let outcome = optimizer.optimize(target)?;

    if !outcome.success {
        print_warning(&outcome.message);
    }

    let threshold = if args.all { f64::NEG_INFINITY } else { context.config.weight_threshold };
    let rows: Vec<WeightRow> = context
        .universe
        .assets()
        .iter()
        .zip(&outcome.weights)
        .filter(|(_, weight)| **weight > threshold)
        .map(|(asset, &weight)| WeightRow {
            asset: asset.name.clone(),
            weight,
        })
        .collect();

    match format {
        OutputFormat::Table => {
            let summary = vec![
                KeyValue::new("Target", target.to_string()),
                KeyValue::new("Solver", optimizer.solver_name()),
                KeyValue::new("Converged", if outcome.success { "yes" } else { "no" }),
                KeyValue::new("Iterations", outcome.iterations.to_string()),
                KeyValue::from_percent("Expected Return", outcome.metrics.expected_return),
                KeyValue::from_percent("Volatility", outcome.metrics.volatility),
                KeyValue::from_percent("Max Drawdown (est.)", outcome.metrics.max_drawdown),
            ];
            print_header("Optimization");
            print_output(&summary, format)?;
            print_header("Weights");
            print_output(&rows, format)?;
        }
        OutputFormat::Json => print_json(&OptimizeReport {
            solver: optimizer.solver_name(),
            outcome: &outcome,
            assets: context.universe.names(),
        })?,
        OutputFormat::Csv => print_output(&rows, format)?,
        OutputFormat::Minimal => {
            println!(
                "Return: {:.4}, Volatility: {:.4}",
                outcome.metrics.expected_return, outcome.metrics.volatility
            );
        }
    }

    Ok(())
}
