pub mod providers;
pub mod loaders;
pub mod cache;

pub use providers::*;
pub use loaders::*;
pub use cache::*;

use parking_lot::RwLock;
use rb_types::{DataError, PortfolioId, PositionSet, RbResult, RiskHistory};
use tracing::{debug, info, warn};

/// Data manager coordinates providers and the per-portfolio caches.
///
/// Providers are consulted in the order they were added. A portfolio no
/// provider knows is reported as [`DataError::PortfolioNotFound`], never as an
/// empty snapshot.
#[derive(Debug)]
pub struct DataManager {
    providers: Vec<Box<dyn PortfolioProvider>>,
    positions: PortfolioCache<PositionSet>,
    histories: PortfolioCache<RiskHistory>,
    selected: RwLock<Option<PortfolioId>>,
}

impl DataManager {
    pub fn new(cache_config: &CacheConfig) -> Self {
        Self {
            providers: Vec::new(),
            positions: PortfolioCache::new(cache_config),
            histories: PortfolioCache::new(cache_config),
            selected: RwLock::new(None),
        }
    }

    pub fn add_provider(&mut self, provider: Box<dyn PortfolioProvider>) {
        info!(provider = provider.name(), "registered portfolio provider");
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: Box<dyn PortfolioProvider>) -> Self {
        self.add_provider(provider);
        self
    }

    /// Current position snapshot, served from cache while fresh.
    pub async fn positions(&self, portfolio: &PortfolioId) -> RbResult<PositionSet> {
        if let Some(set) = self.positions.get(portfolio) {
            debug!(portfolio = %portfolio, "positions cache hit");
            return Ok(set);
        }

        for provider in &self.providers {
            if !provider.supports(portfolio) {
                continue;
            }
            match provider.fetch_positions(portfolio).await {
                Ok(set) => {
                    info!(
                        portfolio = %portfolio,
                        provider = provider.name(),
                        positions = set.len(),
                        "loaded positions"
                    );
                    self.positions.insert(portfolio.clone(), set.clone());
                    return Ok(set);
                }
                Err(e) if e.is_not_found() => {
                    debug!(portfolio = %portfolio, provider = provider.name(), "no positions at provider");
                }
                Err(e) => {
                    warn!(portfolio = %portfolio, provider = provider.name(), error = %e, "failed to load positions");
                    return Err(e);
                }
            }
        }

        Err(Self::not_found(portfolio))
    }

    /// Historical risk series, served from cache while fresh.
    pub async fn risk_history(&self, portfolio: &PortfolioId) -> RbResult<RiskHistory> {
        if let Some(history) = self.histories.get(portfolio) {
            debug!(portfolio = %portfolio, "risk history cache hit");
            return Ok(history);
        }

        for provider in &self.providers {
            if !provider.supports(portfolio) {
                continue;
            }
            match provider.fetch_risk_history(portfolio).await {
                Ok(history) => {
                    info!(
                        portfolio = %portfolio,
                        provider = provider.name(),
                        points = history.len(),
                        "loaded risk history"
                    );
                    self.histories.insert(portfolio.clone(), history.clone());
                    return Ok(history);
                }
                Err(e) if e.is_not_found() => {
                    debug!(portfolio = %portfolio, provider = provider.name(), "no risk history at provider");
                }
                Err(e) => {
                    warn!(portfolio = %portfolio, provider = provider.name(), error = %e, "failed to load risk history");
                    return Err(e);
                }
            }
        }

        Err(Self::not_found(portfolio))
    }

    /// Record a portfolio selection. When the selection changes, the cached
    /// data of the previously selected portfolio is dropped so that returning
    /// to it refetches. Returns true if the selection changed.
    pub fn select_portfolio(&self, portfolio: &PortfolioId) -> bool {
        let mut selected = self.selected.write();
        if selected.as_ref() == Some(portfolio) {
            return false;
        }

        if let Some(previous) = selected.take() {
            self.invalidate(&previous);
            debug!(from = %previous, to = %portfolio, "portfolio selection changed");
        }
        *selected = Some(portfolio.clone());
        true
    }

    pub fn selected_portfolio(&self) -> Option<PortfolioId> {
        self.selected.read().clone()
    }

    /// Drop cached positions and history of one portfolio.
    pub fn invalidate(&self, portfolio: &PortfolioId) {
        self.positions.invalidate(portfolio);
        self.histories.invalidate(portfolio);
    }

    /// Every portfolio any provider can serve, sorted and deduplicated.
    pub async fn portfolios(&self) -> RbResult<Vec<PortfolioId>> {
        let mut all = Vec::new();
        for provider in &self.providers {
            all.extend(provider.list_portfolios().await?);
        }
        all.sort();
        all.dedup();
        Ok(all)
    }

    pub fn positions_cache_stats(&self) -> CacheStats {
        self.positions.get_stats()
    }

    pub fn history_cache_stats(&self) -> CacheStats {
        self.histories.get_stats()
    }

    fn not_found(portfolio: &PortfolioId) -> rb_types::RbError {
        DataError::PortfolioNotFound {
            portfolio: portfolio.to_string(),
        }
        .into()
    }
}
