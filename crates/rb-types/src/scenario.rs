use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{InputError, RbResult};

/// Name of the equity factor shock (fraction).
pub const SPX_FACTOR: &str = "spx_shock";
/// Name of the rates factor shock (basis points).
pub const RATES_FACTOR: &str = "rates_shock_bps";
/// Name of the oil factor shock (fraction).
pub const OIL_FACTOR: &str = "oil_shock";

/// Basis points per unit rate move.
pub const BPS_PER_UNIT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Simultaneous shocks to the three market factors.
///
/// Units are fixed: `spx_shock` and `oil_shock` are fractions (-0.20 is -20%),
/// `rates_shock_bps` is in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShockSet {
    pub spx_shock: Decimal,
    pub rates_shock_bps: Decimal,
    pub oil_shock: Decimal,
}

impl ShockSet {
    pub fn new(spx_shock: Decimal, rates_shock_bps: Decimal, oil_shock: Decimal) -> Self {
        Self {
            spx_shock,
            rates_shock_bps,
            oil_shock,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from floating point inputs, rejecting NaN and infinities.
    pub fn from_f64(spx_shock: f64, rates_shock_bps: f64, oil_shock: f64) -> RbResult<Self> {
        Ok(Self {
            spx_shock: decimal_from_f64(SPX_FACTOR, spx_shock)?,
            rates_shock_bps: decimal_from_f64(RATES_FACTOR, rates_shock_bps)?,
            oil_shock: decimal_from_f64(OIL_FACTOR, oil_shock)?,
        })
    }

    /// Parse textual inputs, e.g. from a form or command line.
    pub fn parse(spx_shock: &str, rates_shock_bps: &str, oil_shock: &str) -> RbResult<Self> {
        Ok(Self {
            spx_shock: parse_shock(SPX_FACTOR, spx_shock)?,
            rates_shock_bps: parse_shock(RATES_FACTOR, rates_shock_bps)?,
            oil_shock: parse_shock(OIL_FACTOR, oil_shock)?,
        })
    }

    /// Rate shock as a decimal fraction (100bps = 0.01).
    pub fn rates_shock_decimal(&self) -> Decimal {
        self.rates_shock_bps / BPS_PER_UNIT
    }

    /// Every shock multiplied by `factor`, or `None` on overflow.
    pub fn scaled(&self, factor: Decimal) -> Option<Self> {
        Some(Self {
            spx_shock: self.spx_shock.checked_mul(factor)?,
            rates_shock_bps: self.rates_shock_bps.checked_mul(factor)?,
            oil_shock: self.oil_shock.checked_mul(factor)?,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.spx_shock.is_zero() && self.rates_shock_bps.is_zero() && self.oil_shock.is_zero()
    }
}

fn decimal_from_f64(factor: &str, value: f64) -> RbResult<Decimal> {
    if !value.is_finite() {
        return Err(InputError::NonNumericShock {
            factor: factor.to_string(),
            value: value.to_string(),
        }
        .into());
    }
    Decimal::from_f64(value).ok_or_else(|| {
        InputError::ShockOutOfRange {
            factor: factor.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Text that is not a finite number is `NonNumericShock`; a number past
/// Decimal's range is `ShockOutOfRange`.
fn parse_shock(factor: &str, raw: &str) -> RbResult<Decimal> {
    let text = raw.trim();
    if let Ok(value) = Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)) {
        return Ok(value);
    }

    let error = match text.parse::<f64>() {
        Ok(value) if value.is_finite() => InputError::ShockOutOfRange {
            factor: factor.to_string(),
            value: raw.to_string(),
        },
        _ => InputError::NonNumericShock {
            factor: factor.to_string(),
            value: raw.to_string(),
        },
    };
    Err(error.into())
}

/// A named set of factor shocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub shocks: ShockSet,
}

impl Scenario {
    pub fn new(name: &str, shocks: ShockSet) -> Self {
        Self {
            name: name.to_string(),
            shocks,
        }
    }

    /// The all-zero scenario.
    pub fn baseline() -> Self {
        Self::new("None (Baseline)", ShockSet::zero())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (spx {}, rates {}bps, oil {})",
            self.name, self.shocks.spx_shock, self.shocks.rates_shock_bps, self.shocks.oil_shock
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RbError;
    use rust_decimal_macros::dec;

    #[test]
    fn from_f64_rejects_nan_and_infinity() {
        let err = ShockSet::from_f64(f64::NAN, 0.0, 0.0).unwrap_err();
        match err {
            RbError::InvalidInput(InputError::NonNumericShock { factor, .. }) => {
                assert_eq!(factor, SPX_FACTOR)
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(ShockSet::from_f64(0.0, f64::INFINITY, 0.0).is_err());
        assert!(ShockSet::from_f64(0.0, 0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn from_f64_keeps_short_decimals_exact() {
        let shocks = ShockSet::from_f64(-0.1, 100.0, 0.2).unwrap();
        assert_eq!(shocks.spx_shock, dec!(-0.1));
        assert_eq!(shocks.rates_shock_bps, dec!(100));
        assert_eq!(shocks.oil_shock, dec!(0.2));
    }

    #[test]
    fn parse_accepts_plain_and_scientific() {
        let shocks = ShockSet::parse("-0.15", " 50 ", "2e-1").unwrap();
        assert_eq!(shocks, ShockSet::new(dec!(-0.15), dec!(50), dec!(0.2)));
    }

    #[test]
    fn parse_rejects_text() {
        let err = ShockSet::parse("0", "lots", "0").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains(RATES_FACTOR));
    }

    #[test]
    fn parse_separates_text_from_out_of_range_numbers() {
        let err = ShockSet::parse("1e30", "0", "0").unwrap_err();
        assert!(matches!(
            err,
            RbError::InvalidInput(InputError::ShockOutOfRange { ref factor, .. }) if factor == SPX_FACTOR
        ));
        assert!(err.is_invalid_input());

        for text in ["abc", "NaN", "inf", ""] {
            let err = ShockSet::parse("0", "0", text).unwrap_err();
            assert!(
                matches!(err, RbError::InvalidInput(InputError::NonNumericShock { .. })),
                "{text}"
            );
        }

        let wide = ShockSet::parse("-1e20", "1e25", "0").unwrap();
        assert_eq!(wide.spx_shock, dec!(-100_000_000_000_000_000_000));
    }

    #[test]
    fn from_f64_out_of_range_is_not_non_numeric() {
        let err = ShockSet::from_f64(-1e30, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, RbError::InvalidInput(InputError::ShockOutOfRange { .. })));
        assert!(ShockSet::from_f64(-1e20, 0.0, 0.0).is_ok());
    }

    #[test]
    fn rates_in_decimal_units() {
        let shocks = ShockSet::new(dec!(0), dec!(100), dec!(0));
        assert_eq!(shocks.rates_shock_decimal(), dec!(0.01));
    }

    #[test]
    fn scaling() {
        let shocks = ShockSet::new(dec!(-0.1), dec!(-75), dec!(-0.1));
        let doubled = shocks.scaled(dec!(2)).unwrap();
        assert_eq!(doubled, ShockSet::new(dec!(-0.2), dec!(-150), dec!(-0.2)));
        assert!(shocks.scaled(dec!(0)).unwrap().is_zero());
        assert!(ShockSet::new(Decimal::MAX, dec!(0), dec!(0)).scaled(dec!(2)).is_none());
    }
}
