//! Summaries of historical risk series.
//!
//! The series themselves come from the data layer; nothing here feeds back
//! into scenario P&L.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rb_types::RiskHistory;

/// Headline figures of a risk history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub portfolio: String,
    pub observations: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub latest_nav: Decimal,
    pub latest_var_99: Decimal,
    pub latest_es_99: Decimal,
    pub peak_var_99: Decimal,
    pub peak_es_99: Decimal,
    /// Most negative drawdown in the window.
    pub max_drawdown: Decimal,
    /// NAV change from first to last observation, as a fraction.
    pub nav_return: Option<Decimal>,
}

impl HistorySummary {
    /// `None` for an empty history.
    pub fn compute(history: &RiskHistory) -> Option<Self> {
        let first = history.points().first()?;
        let latest = history.latest()?;

        let peak_var_99 = history.points().iter().map(|p| p.var_99).max()?;
        let peak_es_99 = history.points().iter().map(|p| p.es_99).max()?;
        let max_drawdown = history.points().iter().map(|p| p.drawdown_pct).min()?;

        let nav_return = if first.nav.is_zero() {
            None
        } else {
            latest
                .nav
                .checked_sub(first.nav)
                .and_then(|change| change.checked_div(first.nav))
        };

        Some(Self {
            portfolio: history.portfolio().to_string(),
            observations: history.len(),
            start: first.date,
            end: latest.date,
            latest_nav: latest.nav,
            latest_var_99: latest.var_99,
            latest_es_99: latest.es_99,
            peak_var_99,
            peak_es_99,
            max_drawdown,
            nav_return,
        })
    }
}
