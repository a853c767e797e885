//! Scenario stress testing and risk summaries for Riskboard.
//!
//! Provides:
//! - Linear factor-sensitivity scenario P&L per position ([`ScenarioEngine`])
//! - Asset-class aggregation of a run ([`ScenarioSummary`])
//! - The predefined scenario library and custom scenario inputs
//! - Headline figures of historical VaR/ES/drawdown series

pub mod engine;
pub mod history;
pub mod scenarios;
pub mod summary;

pub use engine::{FactorContribution, ScenarioEngine, ScenarioRun};
pub use history::HistorySummary;
pub use scenarios::{ScenarioDefinition, ScenarioLibrary, ScenarioSelection, CUSTOM_SCENARIO};
pub use summary::{AssetClassSummary, ScenarioSummary};
