//! Error types for the relay application

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFailed(String),

    #[error("Failed to parse config file: {0}")]
    ParseFailed(String),
}

/// Web server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Bind failed on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },

    #[error("Server terminated: {0}")]
    Terminated(String),
}

/// Wire protocol errors
///
/// Malformed inbound messages are absorbed at the connection loop (the
/// sender is never notified), so these surface only in logs and tests.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
