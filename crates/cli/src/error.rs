//! Error types for CLI operations.

use contracts::ContractError;
use ingestion::ScannerError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parsing or validation error
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// Scanner lifecycle error
    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),

    /// Blocking task failed to complete
    #[error("Background task failed: {message}")]
    Task { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
