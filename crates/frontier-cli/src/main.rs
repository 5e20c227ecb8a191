//! Frontier CLI - Command-line interface for mean-variance portfolio optimization.
//!
//! # Usage
//!
//! ```bash
//! # Show the built-in fund table
//! frontier universe
//!
//! # Minimum-variance portfolio, or a return / risk target
//! frontier optimize
//! frontier optimize --target-return 0.10
//! frontier optimize --target-risk 0.15
//!
//! # Sample the efficient frontier
//! frontier build --points 50
//!
//! # Allocate 100,000 at risk level 7
//! frontier recommend --risk-score 7 --amount 100000
//!
//! # Use your own universe file
//! frontier --universe funds.toml recommend --risk-score 3 --amount 5000
//! ```
//!
//! Logs go to stderr and honour `RUST_LOG`.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Stdout carries the result, so logs only go to stderr
    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let context = commands::Context::load(cli.universe.as_deref(), cli.solver)?;
    let format = cli.format;

    match cli.command {
        Commands::Universe(args) => commands::universe::execute(args, &context, format)?,
        Commands::Optimize(args) => commands::optimize::execute(args, &context, format)?,
        Commands::Build(args) => commands::build::execute(args, &context, format)?,
        Commands::Recommend(args) => commands::recommend::execute(args, &context, format)?,
    }

    Ok(())
}
