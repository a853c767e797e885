//! `riskboard run`: apply one scenario to a portfolio.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;
use tracing::info;

use rb_risk::{FactorContribution, ScenarioEngine, ScenarioRun, ScenarioSelection, ScenarioSummary};
use rb_types::{AssetClass, PortfolioId, ShockSet};

use super::{money, percent, Context};

#[derive(Debug, Serialize)]
pub struct PositionRow {
    pub ticker: String,
    pub asset_class: AssetClass,
    pub market_value: Decimal,
    pub scenario_pnl: Decimal,
    pub contribution: FactorContribution,
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub shocks: ShockSet,
    pub summary: ScenarioSummary,
    pub positions: Vec<PositionRow>,
}

impl ScenarioReport {
    pub fn from_run(run: &ScenarioRun) -> rb_types::RbResult<Self> {
        let positions = run
            .iter()
            .map(|(position, contribution)| PositionRow {
                ticker: position.ticker.clone(),
                asset_class: position.asset_class.clone(),
                market_value: position.market_value,
                scenario_pnl: position.scenario_pnl.unwrap_or_default(),
                contribution: *contribution,
            })
            .collect();

        Ok(Self {
            shocks: run.scenario().shocks,
            summary: ScenarioSummary::from_run(run)?,
            positions,
        })
    }
}

pub async fn run(
    ctx: &Context,
    portfolio: &PortfolioId,
    selection: &ScenarioSelection,
    show_positions: bool,
) -> anyhow::Result<String> {
    let scenario = ctx.library.resolve(selection)?;
    ctx.data.select_portfolio(portfolio);
    let positions = ctx.data.positions(portfolio).await?;

    let run = ScenarioEngine::run(&positions, &scenario)?;
    info!(
        portfolio = %portfolio,
        scenario = %scenario.name,
        total = %run.total(),
        "scenario run complete"
    );

    let report = ScenarioReport::from_run(&run)?;
    ctx.render(&report, |report| table(report, show_positions))
}

fn table(report: &ScenarioReport, show_positions: bool) -> String {
    let summary = &report.summary;
    let shocks = &report.shocks;
    let mut out = String::new();

    let _ = writeln!(out, "Portfolio: {}", summary.portfolio);
    let _ = writeln!(out, "Scenario:  {}", summary.scenario_name);
    let _ = writeln!(
        out,
        "Shocks:    SPX {}, Rates {}bps, Oil {}",
        percent(shocks.spx_shock),
        shocks.rates_shock_bps.normalize(),
        percent(shocks.oil_shock)
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<14} {:>16} {:>16} {:>7}",
        "Asset Class", "Scenario P&L", "Mean P&L", "Count"
    );
    for row in &summary.rows {
        let _ = writeln!(
            out,
            "{:<14} {:>16} {:>16} {:>7}",
            row.asset_class.to_string(),
            money(row.total_pnl),
            money(row.mean_pnl),
            row.count
        );
    }
    let _ = writeln!(
        out,
        "{:<14} {:>16} {:>16} {:>7}",
        "Total",
        money(summary.total_pnl),
        "",
        summary.total_count
    );
    let _ = writeln!(out);

    let factors = &summary.by_factor;
    let _ = writeln!(out, "By factor:");
    let _ = writeln!(out, "  {:<10} {:>16}", "Equity", money(factors.equity));
    let _ = writeln!(out, "  {:<10} {:>16}", "Rates", money(factors.rates));
    let _ = writeln!(out, "  {:<10} {:>16}", "Commodity", money(factors.commodity));
    let _ = writeln!(out);

    let pnl_of = |ticker: &Option<String>| {
        ticker.as_ref().and_then(|t| {
            report
                .positions
                .iter()
                .find(|p| &p.ticker == t)
                .map(|p| format!("{} ({})", t, money(p.scenario_pnl)))
        })
    };
    if let Some(worst) = pnl_of(&summary.worst_ticker) {
        let _ = writeln!(out, "Worst position: {}", worst);
    }
    if let Some(best) = pnl_of(&summary.best_ticker) {
        let _ = writeln!(out, "Best position:  {}", best);
    }
    let _ = writeln!(out, "Total scenario P&L: {}", money(summary.total_pnl));

    if show_positions {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<12} {:<14} {:>16} {:>16} {:>14} {:>14} {:>14}",
            "Ticker", "Asset Class", "Market Value", "Scenario P&L", "Equity", "Rates", "Commodity"
        );
        for row in &report.positions {
            let _ = writeln!(
                out,
                "{:<12} {:<14} {:>16} {:>16} {:>14} {:>14} {:>14}",
                row.ticker,
                row.asset_class.to_string(),
                money(row.market_value),
                money(row.scenario_pnl),
                money(row.contribution.equity),
                money(row.contribution.rates),
                money(row.contribution.commodity)
            );
        }
    }
    out
}
