//! Riskboard CLI - scenario stress testing for portfolio snapshots
//!
//! # Commands
//!
//! - `riskboard scenarios` - List the scenario library
//! - `riskboard portfolios` - List portfolios in the data directory
//! - `riskboard run --portfolio <id> --scenario <name>` - Apply a scenario
//! - `riskboard history --portfolio <id>` - Summarize historical VaR/ES/drawdown

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rb_risk::ScenarioSelection;
use rb_types::{PortfolioId, ShockSet};

mod commands;
mod config;

use commands::{Context, OutputFormat};
use config::DashboardConfig;

/// Riskboard scenario P&L CLI
#[derive(Debug, Parser)]
#[command(name = "riskboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "riskboard.toml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List predefined and configured scenarios
    Scenarios,

    /// List portfolios available in the data directory
    Portfolios,

    /// Apply a scenario to a portfolio's current positions
    Run {
        /// Portfolio identifier
        #[arg(short, long)]
        portfolio: String,

        /// Name of a library scenario
        #[arg(short, long, conflicts_with_all = ["spx", "rates", "oil"])]
        scenario: Option<String>,

        /// Custom SPX move in percent (-15 means -15%)
        #[arg(long, allow_hyphen_values = true)]
        spx: Option<String>,

        /// Custom rates move in basis points
        #[arg(long, allow_hyphen_values = true)]
        rates: Option<String>,

        /// Custom oil move in percent
        #[arg(long, allow_hyphen_values = true)]
        oil: Option<String>,

        /// Also list every position's P&L and factor breakdown
        #[arg(long)]
        positions: bool,
    },

    /// Summarize a portfolio's historical risk
    History {
        /// Portfolio identifier
        #[arg(short, long)]
        portfolio: String,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

impl Commands {
    /// Scenario selection for `run`; absent custom shocks are zero.
    fn selection(
        scenario: Option<String>,
        spx: Option<String>,
        rates: Option<String>,
        oil: Option<String>,
    ) -> rb_types::RbResult<ScenarioSelection> {
        if let Some(name) = scenario {
            return Ok(ScenarioSelection::Predefined(name));
        }
        let or_zero = |v: Option<String>| v.unwrap_or_else(|| "0".to_string());
        let shocks = ShockSet::parse(&or_zero(spx), &or_zero(rates), &or_zero(oil))?;
        Ok(ScenarioSelection::Custom {
            spx_pct: shocks.spx_shock,
            rates_bps: shocks.rates_shock_bps,
            oil_pct: shocks.oil_shock,
        })
    }
}

fn init_logging(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = DashboardConfig::load(&cli.config)?;
    init_logging(cli.verbose, &config.log_level);
    debug!(config = ?config, "configuration loaded");

    let ctx = Context::from_config(&config, cli.format)?;

    let output = match cli.command {
        Commands::Scenarios => commands::scenarios::run(&ctx)?,
        Commands::Portfolios => commands::portfolios::run(&ctx).await?,
        Commands::Run {
            portfolio,
            scenario,
            spx,
            rates,
            oil,
            positions,
        } => {
            let selection = Commands::selection(scenario, spx, rates, oil)?;
            commands::run::run(&ctx, &PortfolioId::from(portfolio), &selection, positions).await?
        }
        Commands::History {
            portfolio,
            start,
            end,
        } => commands::history::run(&ctx, &PortfolioId::from(portfolio), start, end).await?,
    };

    print!("{}", output);

    let stats = ctx.data.positions_cache_stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        hit_rate = stats.hit_rate(),
        "positions cache"
    );
    Ok(())
}
