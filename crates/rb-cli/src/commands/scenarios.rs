//! `riskboard scenarios`: list the scenario library.

use std::fmt::Write;

use rb_types::Scenario;

use super::{percent, Context};

pub fn run(ctx: &Context) -> anyhow::Result<String> {
    ctx.render(&ctx.library.scenarios(), |scenarios| table(scenarios))
}

fn table(scenarios: &[Scenario]) -> String {
    let width = scenarios
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max("Scenario".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:>9}  {:>10}  {:>9}",
        "Scenario", "SPX", "Rates", "Oil"
    );
    for scenario in scenarios {
        let shocks = &scenario.shocks;
        let _ = writeln!(
            out,
            "{:<width$}  {:>9}  {:>7}bps  {:>9}",
            scenario.name,
            percent(shocks.spx_shock),
            shocks.rates_shock_bps.normalize().to_string(),
            percent(shocks.oil_shock),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::OutputFormat;
    use rb_data::{CacheConfig, DataManager};
    use rb_risk::ScenarioLibrary;

    fn context(format: OutputFormat) -> Context {
        Context {
            data: DataManager::new(&CacheConfig::default()),
            library: ScenarioLibrary::builtin(),
            format,
        }
    }

    #[test]
    fn table_lists_builtin_scenarios() {
        let out = run(&context(OutputFormat::Table)).unwrap();
        assert_eq!(out.lines().count(), 6);
        assert!(out.contains("Market Crash (-15% SPX)"));
        assert!(out.contains("-15.00%"));
        assert!(out.contains("-75bps"));
    }

    #[test]
    fn json_lists_builtin_scenarios() {
        let out = run(&context(OutputFormat::Json)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 5);
        assert_eq!(value[0]["name"], "None (Baseline)");
    }
}
