use async_trait::async_trait;
use rb_types::{DataError, PortfolioId, PositionSet, RbResult, RiskHistory};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::loaders::{parse_positions, parse_risk_history};

/// Trait for portfolio data sources (CSV exports, databases, risk systems, ...)
#[async_trait]
pub trait PortfolioProvider: Send + Sync + std::fmt::Debug {
    /// Check if this provider knows the given portfolio
    fn supports(&self, portfolio: &PortfolioId) -> bool;

    /// Current position snapshot of a portfolio
    async fn fetch_positions(&self, portfolio: &PortfolioId) -> RbResult<PositionSet>;

    /// Historical NAV/VaR/ES/drawdown series of a portfolio
    async fn fetch_risk_history(&self, portfolio: &PortfolioId) -> RbResult<RiskHistory>;

    /// Portfolios this provider can serve, sorted
    async fn list_portfolios(&self) -> RbResult<Vec<PortfolioId>>;

    /// Get provider name
    fn name(&self) -> &str;

    /// Get provider configuration
    fn config(&self) -> serde_json::Value;
}

/// CSV provider reading one positions file and one history file per portfolio
#[derive(Debug)]
pub struct CsvPortfolioProvider {
    pub name: String,
    pub data_directory: PathBuf,
    pub positions_pattern: String,
    pub history_pattern: String,
}

impl CsvPortfolioProvider {
    pub const PLACEHOLDER: &'static str = "{portfolio}";

    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            name: "CSV Provider".to_string(),
            data_directory: data_directory.as_ref().to_path_buf(),
            positions_pattern: "{portfolio}_positions.csv".to_string(),
            history_pattern: "{portfolio}_risk.csv".to_string(),
        }
    }

    pub fn with_positions_pattern(mut self, pattern: &str) -> Self {
        self.positions_pattern = pattern.to_string();
        self
    }

    pub fn with_history_pattern(mut self, pattern: &str) -> Self {
        self.history_pattern = pattern.to_string();
        self
    }

    fn positions_path(&self, portfolio: &PortfolioId) -> PathBuf {
        self.data_directory
            .join(self.positions_pattern.replace(Self::PLACEHOLDER, portfolio.as_str()))
    }

    fn history_path(&self, portfolio: &PortfolioId) -> PathBuf {
        self.data_directory
            .join(self.history_pattern.replace(Self::PLACEHOLDER, portfolio.as_str()))
    }

    fn check_supported(&self, portfolio: &PortfolioId) -> RbResult<()> {
        if self.supports(portfolio) {
            Ok(())
        } else {
            Err(DataError::PortfolioNotFound {
                portfolio: portfolio.to_string(),
            }
            .into())
        }
    }

    async fn read_file(&self, portfolio: &PortfolioId, path: &Path) -> RbResult<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                debug!(portfolio = %portfolio, path = %path.display(), bytes = bytes.len(), "read portfolio file");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DataError::PortfolioNotFound {
                portfolio: portfolio.to_string(),
            }
            .into()),
            Err(e) => Err(DataError::LoadingFailed {
                message: format!("{}: {}", path.display(), e),
            }
            .into()),
        }
    }
}

#[async_trait]
impl PortfolioProvider for CsvPortfolioProvider {
    /// Any id usable as a single file name component. Whether the files
    /// exist is only known once they are read.
    fn supports(&self, portfolio: &PortfolioId) -> bool {
        let id = portfolio.as_str();
        !id.is_empty() && id != "." && id != ".." && !id.contains(|c| c == '/' || c == '\\')
    }

    async fn fetch_positions(&self, portfolio: &PortfolioId) -> RbResult<PositionSet> {
        self.check_supported(portfolio)?;
        let path = self.positions_path(portfolio);
        let bytes = self.read_file(portfolio, &path).await?;
        parse_positions(portfolio.clone(), bytes.as_slice())
    }

    async fn fetch_risk_history(&self, portfolio: &PortfolioId) -> RbResult<RiskHistory> {
        self.check_supported(portfolio)?;
        let path = self.history_path(portfolio);
        let bytes = self.read_file(portfolio, &path).await?;
        parse_risk_history(portfolio.clone(), bytes.as_slice())
    }

    async fn list_portfolios(&self) -> RbResult<Vec<PortfolioId>> {
        let (prefix, suffix) = self
            .positions_pattern
            .split_once(Self::PLACEHOLDER)
            .ok_or_else(|| DataError::SourceNotFound(format!(
                "positions pattern {} has no {} placeholder",
                self.positions_pattern,
                Self::PLACEHOLDER
            )))?;

        let mut entries = match tokio::fs::read_dir(&self.data_directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::SourceNotFound(
                    self.data_directory.display().to_string(),
                )
                .into())
            }
            Err(e) => return Err(e.into()),
        };

        let mut portfolios = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(id) = file_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .filter(|id| !id.is_empty())
            {
                portfolios.push(PortfolioId::new(id));
            }
        }

        portfolios.sort();
        Ok(portfolios)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "csv",
            "directory": self.data_directory,
            "positions_pattern": self.positions_pattern,
            "history_pattern": self.history_pattern
        })
    }
}

/// Provider over snapshots registered in code, for embedding callers and tests
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    pub name: String,
    positions: HashMap<PortfolioId, PositionSet>,
    histories: HashMap<PortfolioId, RiskHistory>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            name: "In-Memory Provider".to_string(),
            ..Default::default()
        }
    }

    pub fn with_positions(mut self, positions: PositionSet) -> Self {
        self.positions.insert(positions.portfolio().clone(), positions);
        self
    }

    pub fn with_history(mut self, history: RiskHistory) -> Self {
        self.histories.insert(history.portfolio().clone(), history);
        self
    }

    fn not_found(portfolio: &PortfolioId) -> DataError {
        DataError::PortfolioNotFound {
            portfolio: portfolio.to_string(),
        }
    }
}

#[async_trait]
impl PortfolioProvider for InMemoryProvider {
    fn supports(&self, portfolio: &PortfolioId) -> bool {
        self.positions.contains_key(portfolio) || self.histories.contains_key(portfolio)
    }

    async fn fetch_positions(&self, portfolio: &PortfolioId) -> RbResult<PositionSet> {
        self.positions
            .get(portfolio)
            .cloned()
            .ok_or_else(|| Self::not_found(portfolio).into())
    }

    async fn fetch_risk_history(&self, portfolio: &PortfolioId) -> RbResult<RiskHistory> {
        self.histories
            .get(portfolio)
            .cloned()
            .ok_or_else(|| Self::not_found(portfolio).into())
    }

    async fn list_portfolios(&self) -> RbResult<Vec<PortfolioId>> {
        let mut portfolios: Vec<PortfolioId> = self
            .positions
            .keys()
            .chain(self.histories.keys())
            .cloned()
            .collect();
        portfolios.sort();
        portfolios.dedup();
        Ok(portfolios)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "memory",
            "portfolios": self.positions.len(),
            "histories": self.histories.len()
        })
    }
}
