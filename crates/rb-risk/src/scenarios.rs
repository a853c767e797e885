//! Predefined scenario library and scenario selection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rb_types::{ConfigError, RbResult, Scenario, ShockSet};

/// Label used for ad-hoc scenarios built from user inputs.
pub const CUSTOM_SCENARIO: &str = "Custom";

/// A scenario as written in configuration files.
///
/// Shocks are plain numbers in their fixed units: fractions for `spx_shock`
/// and `oil_shock`, basis points for `rates_shock_bps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    #[serde(default)]
    pub spx_shock: f64,
    #[serde(default)]
    pub rates_shock_bps: f64,
    #[serde(default)]
    pub oil_shock: f64,
}

impl ScenarioDefinition {
    pub fn to_scenario(&self) -> RbResult<Scenario> {
        let shocks = ShockSet::from_f64(self.spx_shock, self.rates_shock_bps, self.oil_shock)?;
        Ok(Scenario::new(&self.name, shocks))
    }
}

/// What the user picked: a named scenario or custom inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenarioSelection {
    Predefined(String),
    /// Equity and oil moves in percent (-15 means -15%), rates in bps.
    Custom {
        spx_pct: Decimal,
        rates_bps: Decimal,
        oil_pct: Decimal,
    },
}

/// Ordered name → shocks mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioLibrary {
    scenarios: Vec<Scenario>,
}

impl Default for ScenarioLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScenarioLibrary {
    pub fn empty() -> Self {
        Self {
            scenarios: Vec::new(),
        }
    }

    /// The stock stress scenarios, baseline first.
    pub fn builtin() -> Self {
        let pct = |n: i64| Decimal::new(n, 2);
        Self {
            scenarios: vec![
                Scenario::baseline(),
                Scenario::new(
                    "Market Crash (-15% SPX)",
                    ShockSet::new(pct(-15), Decimal::ZERO, Decimal::ZERO),
                ),
                Scenario::new(
                    "Rates Shock (+50bps)",
                    ShockSet::new(Decimal::ZERO, Decimal::from(50), Decimal::ZERO),
                ),
                Scenario::new(
                    "Oil Spike (+20%)",
                    ShockSet::new(Decimal::ZERO, Decimal::ZERO, pct(20)),
                ),
                Scenario::new(
                    "Recession Combo (-10% SPX, -75bps Rates)",
                    ShockSet::new(pct(-10), Decimal::from(-75), pct(-10)),
                ),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Add a scenario, replacing one with the same name in place.
    pub fn upsert(&mut self, scenario: Scenario) {
        match self.scenarios.iter_mut().find(|s| s.name == scenario.name) {
            Some(existing) => *existing = scenario,
            None => self.scenarios.push(scenario),
        }
    }

    pub fn extend<I: IntoIterator<Item = Scenario>>(&mut self, scenarios: I) {
        for scenario in scenarios {
            self.upsert(scenario);
        }
    }

    /// Validate and add configured scenarios.
    pub fn extend_from_definitions(&mut self, definitions: &[ScenarioDefinition]) -> RbResult<()> {
        for definition in definitions {
            if definition.name.trim().is_empty() || definition.name == CUSTOM_SCENARIO {
                return Err(ConfigError::Invalid {
                    message: format!("scenario name {:?} is reserved or empty", definition.name),
                }
                .into());
            }
            self.upsert(definition.to_scenario()?);
        }
        Ok(())
    }

    /// Turn a selection into the scenario to run.
    ///
    /// Custom percent inputs are converted to fractions here.
    pub fn resolve(&self, selection: &ScenarioSelection) -> RbResult<Scenario> {
        match selection {
            ScenarioSelection::Predefined(name) => {
                self.get(name).cloned().ok_or_else(|| {
                    ConfigError::ScenarioNotFound { name: name.clone() }.into()
                })
            }
            ScenarioSelection::Custom {
                spx_pct,
                rates_bps,
                oil_pct,
            } => {
                let hundred = Decimal::ONE_HUNDRED;
                let name = format!(
                    "{} ({}%, {}bps, {}%)",
                    CUSTOM_SCENARIO, spx_pct, rates_bps, oil_pct
                );
                Ok(Scenario::new(
                    &name,
                    ShockSet::new(*spx_pct / hundred, *rates_bps, *oil_pct / hundred),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_types::{InputError, RbError};
    use rust_decimal_macros::dec;

    #[test]
    fn builtin_scenarios() {
        let library = ScenarioLibrary::builtin();
        assert_eq!(library.len(), 5);
        assert_eq!(library.names()[0], "None (Baseline)");
        assert!(library.get("None (Baseline)").unwrap().shocks.is_zero());

        let crash = library.get("Market Crash (-15% SPX)").unwrap();
        assert_eq!(crash.shocks.spx_shock, dec!(-0.15));

        let combo = library.get("Recession Combo (-10% SPX, -75bps Rates)").unwrap();
        assert_eq!(combo.shocks, ShockSet::new(dec!(-0.10), dec!(-75), dec!(-0.10)));
    }

    #[test]
    fn resolve_predefined() {
        let library = ScenarioLibrary::builtin();
        let scenario = library
            .resolve(&ScenarioSelection::Predefined("Rates Shock (+50bps)".into()))
            .unwrap();
        assert_eq!(scenario.shocks.rates_shock_bps, dec!(50));

        let err = library
            .resolve(&ScenarioSelection::Predefined("Alien Invasion".into()))
            .unwrap_err();
        assert!(matches!(err, RbError::Config(ConfigError::ScenarioNotFound { .. })));
    }

    #[test]
    fn resolve_custom_converts_percent() {
        let scenario = ScenarioLibrary::builtin()
            .resolve(&ScenarioSelection::Custom {
                spx_pct: dec!(-20),
                rates_bps: dec!(25),
                oil_pct: dec!(5.5),
            })
            .unwrap();
        assert_eq!(scenario.name, "Custom (-20%, 25bps, 5.5%)");
        assert_eq!(scenario.shocks, ShockSet::new(dec!(-0.2), dec!(25), dec!(0.055)));
    }

    #[test]
    fn definitions_extend_and_override() {
        let mut library = ScenarioLibrary::builtin();
        library
            .extend_from_definitions(&[
                ScenarioDefinition {
                    name: "Rates Shock (+50bps)".into(),
                    spx_shock: 0.0,
                    rates_shock_bps: 60.0,
                    oil_shock: 0.0,
                },
                ScenarioDefinition {
                    name: "Stagflation".into(),
                    spx_shock: -0.2,
                    rates_shock_bps: 150.0,
                    oil_shock: 0.4,
                },
            ])
            .unwrap();

        assert_eq!(library.len(), 6);
        assert_eq!(library.names()[2], "Rates Shock (+50bps)");
        assert_eq!(
            library.get("Rates Shock (+50bps)").unwrap().shocks.rates_shock_bps,
            dec!(60)
        );
        assert_eq!(library.names()[5], "Stagflation");
    }

    #[test]
    fn definitions_reject_nan_and_reserved_names() {
        let mut library = ScenarioLibrary::empty();
        let err = library
            .extend_from_definitions(&[ScenarioDefinition {
                name: "Broken".into(),
                spx_shock: f64::NAN,
                rates_shock_bps: 0.0,
                oil_shock: 0.0,
            }])
            .unwrap_err();
        assert!(matches!(err, RbError::InvalidInput(InputError::NonNumericShock { .. })));

        let err = library
            .extend_from_definitions(&[ScenarioDefinition {
                name: CUSTOM_SCENARIO.into(),
                spx_shock: 0.0,
                rates_shock_bps: 0.0,
                oil_shock: 0.0,
            }])
            .unwrap_err();
        assert!(matches!(err, RbError::Config(_)));
        assert!(library.is_empty());
    }
}
