//! Ingestion error types

use std::fmt;

use thiserror::Error;

/// Scanner lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    /// Constructed, not bound to the SDK
    Idle,
    /// Bound to the SDK, callbacks accepted
    Running,
    /// Channels closed, SDK unbound (terminal)
    Stopped,
}

impl fmt::Display for ScannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Ingestion error
#[derive(Debug, Error)]
pub enum ScannerError {
    /// Another scanner already owns the process-wide SDK callbacks
    #[error("another scanner is already bound to the sdk")]
    AlreadyBound,

    /// Lifecycle call made from the wrong state
    #[error("cannot {operation} a scanner that is {state}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// State at the time of the call
        state: ScannerState,
    },

    /// SDK initialization reported failure
    #[error("sdk initialization failed with status {code}")]
    SdkInit {
        /// Status code returned by the SDK
        code: u32,
    },

    /// Rejected scanner configuration
    #[error("invalid scanner config: {message}")]
    InvalidConfig {
        /// Validation message
        message: String,
    },
}

impl ScannerError {
    /// Create invalid state error
    pub fn invalid_state(operation: &'static str, state: ScannerState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Whether the error is a precondition violation (programming error)
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::AlreadyBound | Self::InvalidState { .. })
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, ScannerError>;
