//! CLI error types.

use peer_discovery::{ConfigError, DiscoveryError, FilterError, QueryError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Seeds could not be resolved.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A filter argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] FilterError),

    /// A peer query failed.
    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
