//! Dashboard configuration.
//!
//! Loaded from a TOML file. Every field has a default, so a partial file or
//! no file at all is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use rb_data::{CacheConfig, CsvPortfolioProvider, DataManager};
use rb_risk::{ScenarioDefinition, ScenarioLibrary};
use rb_types::{config_error, RbResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the per-portfolio CSV files.
    pub data_dir: PathBuf,
    pub positions_pattern: String,
    pub history_pattern: String,
    pub cache: CacheConfig,
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Extra scenarios; a name already in the library replaces that entry.
    pub scenarios: Vec<ScenarioDefinition>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("riskboard"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            positions_pattern: "{portfolio}_positions.csv".to_string(),
            history_pattern: "{portfolio}_risk.csv".to_string(),
            cache: CacheConfig::default(),
            log_level: "info".to_string(),
            scenarios: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> RbResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = toml::from_str(&content)
            .map_err(|e| config_error!("{}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RbResult<()> {
        let placeholder = CsvPortfolioProvider::PLACEHOLDER;
        for (key, pattern) in [
            ("positions_pattern", &self.positions_pattern),
            ("history_pattern", &self.history_pattern),
        ] {
            if !pattern.contains(placeholder) {
                return Err(config_error!("{} must contain {}", key, placeholder));
            }
        }

        if self.cache.max_entries == 0 {
            return Err(config_error!("cache.max_entries must be greater than 0"));
        }

        let levels = ["trace", "debug", "info", "warn", "error"];
        if !levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(config_error!(
                "invalid log_level '{}', expected one of {:?}",
                self.log_level,
                levels
            ));
        }
        Ok(())
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    pub fn with_scenario(mut self, scenario: ScenarioDefinition) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Built-in scenarios extended with the configured ones.
    pub fn scenario_library(&self) -> RbResult<ScenarioLibrary> {
        let mut library = ScenarioLibrary::builtin();
        library.extend_from_definitions(&self.scenarios)?;
        Ok(library)
    }

    /// A data manager reading CSV files from `data_dir`.
    pub fn data_manager(&self) -> DataManager {
        let provider = CsvPortfolioProvider::new(&self.data_dir)
            .with_positions_pattern(&self.positions_pattern)
            .with_history_pattern(&self.history_pattern);
        DataManager::new(&self.cache).with_provider(Box::new(provider))
    }
}
