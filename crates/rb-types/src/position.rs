use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::{InputError, RbResult};

/// Identifier of a portfolio as known to the data sources
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(String);

impl PortfolioId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortfolioId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PortfolioId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset class label used for grouping scenario results.
///
/// Labels outside the well-known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssetClass {
    Equity,
    FixedIncome,
    Fx,
    Commodity,
    Cash,
    Other(String),
}

impl FromStr for AssetClass {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.is_empty() {
            return Err(InputError::InvalidField {
                row: 0,
                column: "AssetClass".to_string(),
                message: "empty asset class".to_string(),
            });
        }

        let normalized: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        Ok(match normalized.as_str() {
            "equity" | "equities" => AssetClass::Equity,
            "fixedincome" | "bond" | "bonds" => AssetClass::FixedIncome,
            "fx" | "forex" => AssetClass::Fx,
            "commodity" | "commodities" => AssetClass::Commodity,
            "cash" => AssetClass::Cash,
            _ => AssetClass::Other(label.to_string()),
        })
    }
}

impl TryFrom<String> for AssetClass {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetClass> for String {
    fn from(value: AssetClass) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetClass::Equity => "Equity",
            AssetClass::FixedIncome => "Fixed Income",
            AssetClass::Fx => "FX",
            AssetClass::Commodity => "Commodity",
            AssetClass::Cash => "Cash",
            AssetClass::Other(label) => label.as_str(),
        };
        write!(f, "{}", s)
    }
}

/// One holding in a portfolio snapshot with its factor sensitivities.
///
/// A sensitivity of `None` means the position does not respond to that factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub asset_class: AssetClass,
    /// Signed currency amount; negative for shorts.
    pub market_value: Decimal,
    /// Equity-market beta, unitless.
    pub beta: Option<Decimal>,
    /// Rate duration in years, applied to basis-point shocks.
    pub duration: Option<Decimal>,
    /// Commodity delta per unit fractional oil move.
    pub oil_delta: Option<Decimal>,
    /// Set by the scenario engine; refers to the most recent run only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_pnl: Option<Decimal>,
}

impl Position {
    pub fn new(ticker: &str, asset_class: AssetClass, market_value: Decimal) -> Self {
        Self {
            ticker: ticker.to_string(),
            asset_class,
            market_value,
            beta: None,
            duration: None,
            oil_delta: None,
            scenario_pnl: None,
        }
    }

    pub fn with_beta(mut self, beta: Decimal) -> Self {
        self.beta = Some(beta);
        self
    }

    pub fn with_duration(mut self, duration: Decimal) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_oil_delta(mut self, oil_delta: Decimal) -> Self {
        self.oil_delta = Some(oil_delta);
        self
    }

    pub fn is_short(&self) -> bool {
        self.market_value < Decimal::ZERO
    }
}

/// Snapshot of all positions held by one portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSet {
    portfolio: PortfolioId,
    positions: Vec<Position>,
}

impl PositionSet {
    /// Build a snapshot, rejecting duplicate tickers.
    pub fn new(portfolio: PortfolioId, positions: Vec<Position>) -> RbResult<Self> {
        let set = Self {
            portfolio,
            positions,
        };
        set.check_unique_tickers()?;
        Ok(set)
    }

    pub fn portfolio(&self) -> &PortfolioId {
        &self.portfolio
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Position> {
        self.positions.iter()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    pub fn total_market_value(&self) -> Decimal {
        self.positions.iter().map(|p| p.market_value).sum()
    }

    /// Sum of `scenario_pnl`, or `None` if any position has not been run.
    pub fn total_scenario_pnl(&self) -> Option<Decimal> {
        self.positions
            .iter()
            .map(|p| p.scenario_pnl)
            .sum::<Option<Decimal>>()
    }

    /// Check the invariants the scenario engine relies on.
    pub fn validate(&self) -> RbResult<()> {
        if self.positions.is_empty() {
            return Err(InputError::EmptyPositions.into());
        }
        self.check_unique_tickers()
    }

    fn check_unique_tickers(&self) -> RbResult<()> {
        let mut seen = HashSet::with_capacity(self.positions.len());
        for position in &self.positions {
            if !seen.insert(position.ticker.as_str()) {
                return Err(InputError::DuplicateTicker {
                    ticker: position.ticker.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PositionSet {
    type Item = &'a Position;
    type IntoIter = std::slice::Iter<'a, Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RbError;
    use rust_decimal_macros::dec;

    #[test]
    fn asset_class_parsing() {
        assert_eq!("Equity".parse::<AssetClass>().unwrap(), AssetClass::Equity);
        assert_eq!("Fixed Income".parse::<AssetClass>().unwrap(), AssetClass::FixedIncome);
        assert_eq!("FixedIncome".parse::<AssetClass>().unwrap(), AssetClass::FixedIncome);
        assert_eq!("fx".parse::<AssetClass>().unwrap(), AssetClass::Fx);
        assert_eq!(
            "Crypto".parse::<AssetClass>().unwrap(),
            AssetClass::Other("Crypto".to_string())
        );
        assert!("  ".parse::<AssetClass>().is_err());
    }

    #[test]
    fn asset_class_serializes_as_label() {
        let json = serde_json::to_string(&AssetClass::FixedIncome).unwrap();
        assert_eq!(json, "\"Fixed Income\"");
        let back: AssetClass = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AssetClass::FixedIncome);
    }

    #[test]
    fn duplicate_tickers_rejected() {
        let result = PositionSet::new(
            "Portfolio A".into(),
            vec![
                Position::new("AAPL", AssetClass::Equity, dec!(100)),
                Position::new("AAPL", AssetClass::Equity, dec!(200)),
            ],
        );

        match result {
            Err(RbError::InvalidInput(InputError::DuplicateTicker { ticker })) => {
                assert_eq!(ticker, "AAPL")
            }
            other => panic!("expected duplicate ticker error, got {:?}", other),
        }
    }

    #[test]
    fn empty_set_fails_validation() {
        let set = PositionSet::new("Portfolio A".into(), Vec::new()).unwrap();
        assert!(set.is_empty());
        assert!(matches!(
            set.validate(),
            Err(RbError::InvalidInput(InputError::EmptyPositions))
        ));
    }

    #[test]
    fn totals() {
        let mut short = Position::new("TLT", AssetClass::FixedIncome, dec!(-50_000));
        assert!(short.is_short());
        let long = Position::new("AAPL", AssetClass::Equity, dec!(150_000)).with_beta(dec!(1.1));

        let set = PositionSet::new("Portfolio A".into(), vec![long.clone(), short.clone()]).unwrap();
        assert_eq!(set.total_market_value(), dec!(100_000));
        assert_eq!(set.total_scenario_pnl(), None);

        short.scenario_pnl = Some(dec!(10));
        let mut long = long;
        long.scenario_pnl = Some(dec!(-25));
        let set = PositionSet::new("Portfolio A".into(), vec![long, short]).unwrap();
        assert_eq!(set.total_scenario_pnl(), Some(dec!(-15)));
        assert_eq!(set.get("AAPL").and_then(|p| p.beta), Some(dec!(1.1)));
    }
}
