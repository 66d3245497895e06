//! Error types for the EgyptEternal client core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum EeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type EeResult<T> = Result<T, EeError>;
