//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur in the logging subsystem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed, or installing one failed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),
    /// Settings that cannot be turned into a subscriber
    #[error("Invalid logging configuration: {0}")]
    InvalidConfiguration(String),
}
