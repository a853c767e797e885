//! `riskboard history`: headline figures of a portfolio's risk history.

use chrono::NaiveDate;
use std::fmt::Write;
use tracing::{info, warn};

use rb_risk::HistorySummary;
use rb_types::PortfolioId;

use super::{money, percent, Context};

pub async fn run(
    ctx: &Context,
    portfolio: &PortfolioId,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> anyhow::Result<String> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            anyhow::bail!("--start {} is after --end {}", start, end);
        }
    }

    ctx.data.select_portfolio(portfolio);
    let history = ctx.data.risk_history(portfolio).await?;
    let window = history.window(start, end);

    let summary = HistorySummary::compute(&window);
    match &summary {
        Some(s) => info!(portfolio = %portfolio, observations = s.observations, "risk history summarized"),
        None => warn!(portfolio = %portfolio, "no risk history in window"),
    }

    ctx.render(&summary, |summary| match summary {
        Some(s) => table(s),
        None => format!("No risk history for {} in the selected window\n", portfolio),
    })
}

fn table(s: &HistorySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Portfolio:     {}", s.portfolio);
    let _ = writeln!(out, "Window:        {} to {} ({} observations)", s.start, s.end, s.observations);
    let _ = writeln!(out, "Latest NAV:    {}", money(s.latest_nav));
    if let Some(ret) = s.nav_return {
        let _ = writeln!(out, "NAV return:    {}", percent(ret));
    }
    let _ = writeln!(out, "Latest VaR 99: {}", money(s.latest_var_99));
    let _ = writeln!(out, "Latest ES 99:  {}", money(s.latest_es_99));
    let _ = writeln!(out, "Peak VaR 99:   {}", money(s.peak_var_99));
    let _ = writeln!(out, "Peak ES 99:    {}", money(s.peak_es_99));
    let _ = writeln!(out, "Max drawdown:  {}", percent(s.max_drawdown));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::OutputFormat;
    use crate::config::DashboardConfig;

    const HISTORY: &str = "\
Date,NAV,VaR_99_USD,ES_99_USD,Drawdown_Pct
2024-01-02,1000000,20000,26000,0
2024-01-03,1050000,25000,32500,0
2024-01-04,1000000,30000,39000,-0.0476
2024-01-05,1020000,22000,28600,-0.0286
";

    fn context(format: OutputFormat) -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Portfolio A_risk.csv"), HISTORY).unwrap();
        let config = DashboardConfig::default().with_data_dir(dir.path());
        let ctx = Context::from_config(&config, format).unwrap();
        (dir, ctx)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn full_history_table() {
        let (_dir, ctx) = context(OutputFormat::Table);
        let out = run(&ctx, &"Portfolio A".into(), None, None).await.unwrap();
        assert!(out.contains("2024-01-02 to 2024-01-05 (4 observations)"));
        assert!(out.contains("Latest NAV:    1,020,000"));
        assert!(out.contains("Peak VaR 99:   30,000"));
        assert!(out.contains("Max drawdown:  -4.76%"));
    }

    #[tokio::test]
    async fn window_is_inclusive() {
        let (_dir, ctx) = context(OutputFormat::Json);
        let out = run(&ctx, &"Portfolio A".into(), Some(date(3)), Some(date(4)))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["observations"], 2);
        assert_eq!(value["start"], "2024-01-03");
        assert_eq!(value["end"], "2024-01-04");
    }

    #[tokio::test]
    async fn empty_window() {
        let (_dir, ctx) = context(OutputFormat::Table);
        let out = run(&ctx, &"Portfolio A".into(), Some(date(20)), None).await.unwrap();
        assert!(out.starts_with("No risk history"));
    }

    #[tokio::test]
    async fn reversed_window_is_rejected() {
        let (_dir, ctx) = context(OutputFormat::Table);
        assert!(run(&ctx, &"Portfolio A".into(), Some(date(5)), Some(date(2)))
            .await
            .is_err());
    }
}
