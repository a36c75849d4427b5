//! CLI error type.

use groundlevel::app::AppError;
use groundlevel::cascade::ResolveError;
use groundlevel::config::ConfigError;
use groundlevel::logging::LoggingError;
use groundlevel::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    App(#[from] AppError),

    /// The cascade ran and produced no elevation.
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("Cache error: {0}")]
    Cache(#[from] StoreError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// A failed resolution exits with 2 so scripts can tell "no elevation"
    /// apart from a broken setup.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Resolve(_) => 2,
            _ => 1,
        }
    }
}
