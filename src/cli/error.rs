//! CLI error types and conversions

use crate::ForexError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Library error
    #[error("{0}")]
    Forex(#[from] ForexError),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
