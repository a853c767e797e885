//! `riskboard portfolios`: list the portfolios the data directory provides.

use tracing::info;

use super::Context;

pub async fn run(ctx: &Context) -> anyhow::Result<String> {
    let portfolios = ctx.data.portfolios().await?;
    info!(count = portfolios.len(), "listed portfolios");

    ctx.render(&portfolios, |portfolios| {
        if portfolios.is_empty() {
            return "No portfolios found\n".to_string();
        }
        portfolios.iter().map(|p| format!("{}\n", p)).collect()
    })
}
