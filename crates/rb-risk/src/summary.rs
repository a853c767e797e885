//! Asset-class aggregation of a scenario run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rb_types::{AssetClass, InputError, RbResult};

use crate::engine::{FactorContribution, ScenarioRun};

/// Scenario P&L of all positions sharing one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClassSummary {
    pub asset_class: AssetClass,
    pub total_pnl: Decimal,
    pub mean_pnl: Decimal,
    pub count: usize,
}

/// Display-ready summary of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub portfolio: String,
    pub scenario_name: String,
    /// One row per asset class, sorted by asset class.
    pub rows: Vec<AssetClassSummary>,
    pub total_pnl: Decimal,
    pub total_count: usize,
    pub by_factor: FactorContribution,
    pub worst_ticker: Option<String>,
    pub best_ticker: Option<String>,
}

impl ScenarioSummary {
    /// Group the run by asset class. The row totals add up to the grand total.
    pub fn from_run(run: &ScenarioRun) -> RbResult<Self> {
        let mut groups: BTreeMap<&AssetClass, (Decimal, usize)> = BTreeMap::new();

        for position in run.positions() {
            let pnl = position.scenario_pnl.unwrap_or_default();
            let entry = groups.entry(&position.asset_class).or_insert((Decimal::ZERO, 0));
            entry.0 = entry.0.checked_add(pnl).ok_or_else(|| InputError::Overflow {
                ticker: position.ticker.clone(),
            })?;
            entry.1 += 1;
        }

        let rows = groups
            .into_iter()
            .map(|(asset_class, (total_pnl, count))| AssetClassSummary {
                asset_class: asset_class.clone(),
                total_pnl,
                mean_pnl: total_pnl / Decimal::from(count),
                count,
            })
            .collect();

        Ok(Self {
            portfolio: run.positions().portfolio().to_string(),
            scenario_name: run.scenario().name.clone(),
            rows,
            total_pnl: run.total(),
            total_count: run.positions().len(),
            by_factor: run.by_factor(),
            worst_ticker: run.worst().map(|p| p.ticker.clone()),
            best_ticker: run.best().map(|p| p.ticker.clone()),
        })
    }

    pub fn row(&self, asset_class: &AssetClass) -> Option<&AssetClassSummary> {
        self.rows.iter().find(|r| &r.asset_class == asset_class)
    }
}
