//! Recommend command implementation.
//!
//! Runs the full pipeline: frontier, risk mapping and allocation plan.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use frontier_portfolio::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::{validate_amount, validate_risk_score, Context};
use crate::output::{
    display_currency, display_percent, format_percent, print_header, print_json, print_output,
    print_warning, KeyValue,
};

/// Arguments for the recommend command.
#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Risk score from 1 (most cautious) to 10 (most aggressive)
    #[arg(short, long)]
    pub risk_score: f64,

    /// Amount to invest
    #[arg(short, long)]
    pub amount: f64,
}

#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Weight", display_with = "display_percent")]
    weight: f64,
    #[tabled(rename = "Amount", display_with = "display_currency")]
    amount: f64,
}

impl From<&AllocationEntry> for EntryRow {
    fn from(entry: &AllocationEntry) -> Self {
        Self {
            asset: entry.asset.clone(),
            weight: entry.weight,
            amount: entry.amount,
        }
    }
}

/// Execute the recommend command.
pub fn execute(args: RecommendArgs, context: &Context, format: OutputFormat) -> Result<()> {
    let risk_score = validate_risk_score(args.risk_score)?;
    let amount = validate_amount(args.amount)?;

    let advisor = Advisor::new(context.universe.clone(), context.config.clone())?;
    let recommendation = advisor.recommend(risk_score, amount)?;
    let plan = &recommendation.plan;

    if recommendation.fallback {
        print_warning("Frontier could not be built; showing the equal-weight portfolio");
    }

    let rows: Vec<EntryRow> = plan.entries.iter().map(EntryRow::from).collect();

    match format {
        OutputFormat::Table => {
            print_header(&format!("Recommended Allocation (risk score {})", plan.risk_score));
            print_output(&rows, format)?;

            let mut summary = vec![
                KeyValue::from_currency("Total Amount", plan.total_amount),
                KeyValue::from_percent("Expected Return", plan.expected_return),
                KeyValue::from_percent("Volatility", plan.volatility),
                KeyValue::from_percent("Max Drawdown (est.)", plan.max_drawdown),
            ];
            if let Some(index) = recommendation.frontier.selected_index {
                summary.push(KeyValue::new(
                    "Frontier Point",
                    format!("{} of {}", index + 1, recommendation.frontier.retained),
                ));
            }
            print_header("Portfolio");
            print_output(&summary, format)?;
        }
        OutputFormat::Json => print_json(&recommendation)?,
        OutputFormat::Csv => print_output(&rows, format)?,
        OutputFormat::Minimal => {
            for entry in &plan.entries {
                println!("{}\t{}", entry.asset, format_percent(entry.weight));
            }
        }
    }

    Ok(())
}
