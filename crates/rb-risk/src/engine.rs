//! Scenario P&L engine.
//!
//! [`ScenarioEngine`] applies a [`Scenario`] to a [`PositionSet`] with a linear
//! factor-sensitivity model:
//!
//! ```text
//! pnl = market_value * ( beta * spx_shock
//!                      - duration / 10_000 * rates_shock_bps
//!                      + oil_delta * oil_shock )
//! ```
//!
//! Rates up is a loss for positive duration; beta and oil delta move with
//! their shocks. A missing sensitivity contributes nothing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rb_types::scenario::BPS_PER_UNIT;
use rb_types::{InputError, Position, PositionSet, RbResult, Scenario, ShockSet};

/// Scenario P&L of one position split by market factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FactorContribution {
    pub equity: Decimal,
    pub rates: Decimal,
    pub commodity: Decimal,
}

impl FactorContribution {
    fn checked_total(&self) -> Option<Decimal> {
        self.equity
            .checked_add(self.rates)?
            .checked_add(self.commodity)
    }

    fn checked_add(&self, other: &Self) -> Option<Self> {
        Some(Self {
            equity: self.equity.checked_add(other.equity)?,
            rates: self.rates.checked_add(other.rates)?,
            commodity: self.commodity.checked_add(other.commodity)?,
        })
    }
}

/// Result of applying one scenario to one position set.
///
/// `positions` is a copy of the input with `scenario_pnl` populated;
/// `contributions[i]` belongs to `positions[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRun {
    scenario: Scenario,
    positions: PositionSet,
    contributions: Vec<FactorContribution>,
    total: Decimal,
    by_factor: FactorContribution,
}

impl ScenarioRun {
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn positions(&self) -> &PositionSet {
        &self.positions
    }

    pub fn into_positions(self) -> PositionSet {
        self.positions
    }

    /// Positions paired with their factor breakdown, in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&Position, &FactorContribution)> {
        self.positions.iter().zip(self.contributions.iter())
    }

    /// Portfolio-level scenario impact: the sum of every position's P&L.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Portfolio-level impact per factor; the three parts sum to [`Self::total`].
    pub fn by_factor(&self) -> FactorContribution {
        self.by_factor
    }

    /// Position with the lowest scenario P&L (first one on ties).
    pub fn worst(&self) -> Option<&Position> {
        self.positions
            .iter()
            .reduce(|worst, p| if pnl_of(p) < pnl_of(worst) { p } else { worst })
    }

    /// Position with the highest scenario P&L (first one on ties).
    pub fn best(&self) -> Option<&Position> {
        self.positions
            .iter()
            .reduce(|best, p| if pnl_of(p) > pnl_of(best) { p } else { best })
    }
}

fn pnl_of(position: &Position) -> Decimal {
    position.scenario_pnl.unwrap_or_default()
}

/// Stateless scenario P&L calculator.
pub struct ScenarioEngine;

impl ScenarioEngine {
    /// Apply `scenario` to every position.
    ///
    /// Fails with invalid input when the set is empty or has duplicate
    /// tickers, or when a product leaves the representable range. The input
    /// is not modified.
    pub fn run(positions: &PositionSet, scenario: &Scenario) -> RbResult<ScenarioRun> {
        positions.validate()?;

        let mut rows = Vec::with_capacity(positions.len());
        let mut contributions = Vec::with_capacity(positions.len());
        let mut total = Decimal::ZERO;
        let mut by_factor = FactorContribution::default();

        for position in positions {
            let contribution = Self::contribution(position, &scenario.shocks)?;
            let overflow = || InputError::Overflow {
                ticker: position.ticker.clone(),
            };

            let pnl = contribution.checked_total().ok_or_else(overflow)?;
            total = total.checked_add(pnl).ok_or_else(overflow)?;
            by_factor = by_factor.checked_add(&contribution).ok_or_else(overflow)?;

            let mut row = position.clone();
            row.scenario_pnl = Some(pnl);
            rows.push(row);
            contributions.push(contribution);
        }

        debug!(
            portfolio = %positions.portfolio(),
            scenario = %scenario.name,
            positions = rows.len(),
            total = %total,
            "scenario applied"
        );

        Ok(ScenarioRun {
            scenario: scenario.clone(),
            positions: PositionSet::new(positions.portfolio().clone(), rows)?,
            contributions,
            total,
            by_factor,
        })
    }

    /// Scenario P&L of a single position, split by factor.
    pub fn contribution(position: &Position, shocks: &ShockSet) -> RbResult<FactorContribution> {
        let overflow = || InputError::Overflow {
            ticker: position.ticker.clone(),
        };
        let mv = position.market_value;

        // mv * sensitivity * shock; an absent sensitivity never touches the shock
        let term = |sensitivity: Option<Decimal>, shock: Decimal| -> Result<Decimal, InputError> {
            match sensitivity {
                None => Ok(Decimal::ZERO),
                Some(s) => mv
                    .checked_mul(s)
                    .and_then(|exposure| exposure.checked_mul(shock))
                    .ok_or_else(overflow),
            }
        };

        let equity = term(position.beta, shocks.spx_shock)?;
        let commodity = term(position.oil_delta, shocks.oil_shock)?;
        let rates = -term(position.duration, shocks.rates_shock_bps)?
            .checked_div(BPS_PER_UNIT)
            .ok_or_else(overflow)?;

        Ok(FactorContribution {
            equity,
            rates,
            commodity,
        })
    }
}
