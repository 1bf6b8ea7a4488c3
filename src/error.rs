//! # Error Types
//!
//! Custom error types for IMU Scope using `thiserror`.
//!
//! Only conditions that end an operation live here. Per-record decoding
//! problems (wrong token count, unparsable fields) are reported as values by
//! [`crate::protocol::state`] and never surface as `Err`.

use thiserror::Error;

/// Main error type for IMU Scope
#[derive(Debug, Error)]
pub enum ImuScopeError {
    /// Serial port could not be configured or opened
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate device paths could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// An open connection failed while reading
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sample record serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for IMU Scope
pub type Result<T> = std::result::Result<T, ImuScopeError>;
