//! CLI command implementations
//!
//! Each command builds a serializable report and renders it as a text table
//! or as JSON. Rendering returns a `String` so that `main` owns stdout.

pub mod history;
pub mod portfolios;
pub mod run;
pub mod scenarios;

use clap::ValueEnum;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use rb_data::DataManager;
use rb_risk::ScenarioLibrary;

use crate::config::DashboardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Shared state every command runs against.
pub struct Context {
    pub data: DataManager,
    pub library: ScenarioLibrary,
    pub format: OutputFormat,
}

impl Context {
    pub fn from_config(config: &DashboardConfig, format: OutputFormat) -> rb_types::RbResult<Self> {
        Ok(Self {
            data: config.data_manager(),
            library: config.scenario_library()?,
            format,
        })
    }

    /// JSON for machine consumers, otherwise the command's own table.
    pub fn render<T, F>(&self, report: &T, table: F) -> anyhow::Result<String>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(table(report)),
        }
    }
}

/// Whole currency units with thousands separators, e.g. `-12,000`.
pub(crate) fn money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// A fraction as a percentage with two decimals, e.g. `-15.00%`.
pub(crate) fn percent(value: Decimal) -> String {
    let pct = (value * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}%", pct)
}
