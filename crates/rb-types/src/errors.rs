use thiserror::Error;

/// Main error type for the Riskboard system
#[derive(Error, Debug)]
pub enum RbError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RbError {
    /// Errors the caller must fix before retrying; nothing in this class is
    /// transient.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RbError::InvalidInput(_))
    }

    /// True when a data source reported that the portfolio does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RbError::Data(DataError::PortfolioNotFound { .. }))
    }
}

/// Malformed engine input: positions or shocks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Position collection is empty")]
    EmptyPositions,

    #[error("Shock for {factor} is not numeric: {value}")]
    NonNumericShock { factor: String, value: String },

    #[error("Shock for {factor} is outside the representable range: {value}")]
    ShockOutOfRange { factor: String, value: String },

    #[error("Required column missing: {column}")]
    MissingColumn { column: String },

    #[error("Ticker appears more than once: {ticker}")]
    DuplicateTicker { ticker: String },

    #[error("Invalid value in row {row}, column {column}: {message}")]
    InvalidField {
        row: usize,
        column: String,
        message: String,
    },

    #[error("Scenario P&L for {ticker} is outside the representable range")]
    Overflow { ticker: String },
}

/// Data-access errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Portfolio not found: {portfolio}")]
    PortfolioNotFound { portfolio: String },

    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    #[error("Data parsing error: {message}")]
    ParseError { message: String },

    #[error("Data loading failed: {message}")]
    LoadingFailed { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown scenario: {name}")]
    ScenarioNotFound { name: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Result type alias for Riskboard operations
pub type RbResult<T> = Result<T, RbError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::RbError::Config($crate::ConfigError::Invalid {
            message: format!($($arg)*),
        })
    };
}
