//! Error types for GponSim

use thiserror::Error;

/// Result type alias for GponSim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for GponSim
///
/// Domain outcomes that callers must distinguish from success (an exhausted
/// DHCP pool, a failed OMCI roll, an unknown scenario action) are *not*
/// errors; they are modeled as result values by the engines that produce
/// them. This enum covers the cases that genuinely fail an operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found (unknown scenario id, unknown device id)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A run for this scenario id is already active
    #[error("Scenario '{0}' is already running")]
    AlreadyRunning(String),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Protocol-state error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Execution failed (task join failure, runner shutting down)
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Operation interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),
}

impl Error {
    /// Create a not-found error with a custom message
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a protocol error with a custom message
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
