//! Build command implementation.
//!
//! Samples the efficient frontier and prints one row per retained point.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use frontier_portfolio::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::{validate_points, Context};
use crate::output::{display_percent, print_header, print_info, print_json, print_output, print_warning};

/// Arguments for the build command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Number of grid points. Defaults to the configured frontier size.
    #[arg(short, long)]
    pub points: Option<usize>,
}

#[derive(Debug, Serialize, Tabled)]
struct PointRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Target Return", display_with = "display_percent")]
    target_return: f64,
    #[tabled(rename = "Expected Return", display_with = "display_percent")]
    expected_return: f64,
    #[tabled(rename = "Volatility", display_with = "display_percent")]
    volatility: f64,
    #[tabled(rename = "Max Drawdown", display_with = "display_percent")]
    max_drawdown: f64,
}

#[derive(Debug, Serialize)]
struct FrontierReport<'a> {
    assets: Vec<&'a str>,
    #[serde(flatten)]
    frontier: &'a Frontier,
}

/// Execute the build command.
pub fn execute(args: BuildArgs, context: &Context, format: OutputFormat) -> Result<()> {
    let points = validate_points(args.points.unwrap_or(context.config.frontier_points))?;
    let frontier = FrontierBuilder::new(&context.universe, &context.config).build(points);

    if frontier.is_empty() {
        print_warning("No frontier point could be solved");
    } else if frontier.is_sparse(context.config.min_frontier_points) {
        print_warning(&format!(
            "Only {} of {} frontier points were solved",
            frontier.len(),
            frontier.requested
        ));
    }

    let rows: Vec<PointRow> = frontier
        .iter()
        .enumerate()
        .map(|(index, point)| PointRow {
            index,
            target_return: point.target_return,
            expected_return: point.metrics.expected_return,
            volatility: point.metrics.volatility,
            max_drawdown: point.metrics.max_drawdown,
        })
        .collect();

    match format {
        OutputFormat::Table => {
            print_header("Efficient Frontier");
            print_output(&rows, format)?;
            print_info(&format!(
                "{} of {} points retained, {} skipped",
                frontier.len(),
                frontier.requested,
                frontier.skipped
            ));
        }
        OutputFormat::Json => print_json(&FrontierReport {
            assets: context.universe.names(),
            frontier: &frontier,
        })?,
        OutputFormat::Csv => print_output(&rows, format)?,
        OutputFormat::Minimal => println!("{}/{}", frontier.len(), frontier.requested),
    }

    Ok(())
}
