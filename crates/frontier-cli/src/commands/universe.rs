//! Universe command implementation.
//!
//! Shows the asset statistics table the engine is working with.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use frontier_portfolio::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::Context;
use crate::output::{display_percent, format_percent, print_header, print_info, print_output};

/// Arguments for the universe command.
#[derive(Args, Debug)]
pub struct UniverseArgs {
    /// Print the universe as a TOML file that `--universe` accepts
    #[arg(long)]
    pub template: bool,
}

/// One row of the statistics table.
#[derive(Debug, Serialize, Tabled)]
struct AssetRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Expected Return", display_with = "display_percent")]
    expected_return: f64,
    #[tabled(rename = "Volatility", display_with = "display_percent")]
    volatility: f64,
}

/// Execute the universe command.
pub fn execute(args: UniverseArgs, context: &Context, format: OutputFormat) -> Result<()> {
    let universe = &context.universe;

    if args.template {
        let file = UniverseFile {
            covariance: universe.covariance().to_vec(),
            assets: universe.assets().to_vec(),
            engine: Some(context.config.clone()),
        };
        print!("{}", file.to_toml_string()?);
        return Ok(());
    }

    let rows: Vec<AssetRow> = universe
        .assets()
        .iter()
        .enumerate()
        .map(|(i, asset)| AssetRow {
            asset: asset.name.clone(),
            expected_return: asset.expected_return,
            volatility: universe.asset_volatility(i).unwrap_or_default(),
        })
        .collect();

    match format {
        OutputFormat::Table => {
            print_header("Asset Universe");
            print_output(&rows, format)?;
            print_info(&format!(
                "{} assets, expected returns {} to {}",
                universe.len(),
                format_percent(universe.min_return()),
                format_percent(universe.max_return()),
            ));
        }
        OutputFormat::Json | OutputFormat::Csv => print_output(&rows, format)?,
        OutputFormat::Minimal => {
            for name in universe.names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}
