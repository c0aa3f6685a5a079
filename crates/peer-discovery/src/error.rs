//! Error types for peer discovery.
//!
//! Bootstrap failures are collapsed into [`DiscoveryError`], while failures of
//! the peer-list and verification fetches surface as [`QueryError`] with the
//! timeout, status and transport details intact.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while resolving the initial seed set.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Bootstrap failed: bad input, transport failure, bad status or bad payload.
    #[error("failed to discover any peers: {0}")]
    Failed(String),

    /// The bootstrap source answered but listed no peers.
    #[error("no seeds found")]
    NoSeeds,
}

/// Errors raised by the HTTP transport itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request failed after the connection was made.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Errors raised by peer-list and verification fetches.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// Requested URL.
        url: String,
        /// The configured timeout.
        timeout: Duration,
    },

    /// The peer answered with a non-2xx status.
    #[error("request to {url} failed with status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The transport failed before a response was received.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The response body was not the expected JSON shape.
    #[error("invalid response from {url}: {reason}")]
    Validation {
        /// Requested URL.
        url: String,
        /// What was wrong with the payload.
        reason: String,
    },
}

impl QueryError {
    /// Returns true if another attempt may succeed.
    ///
    /// Timeouts, transport failures and the usual transient statuses are
    /// retryable; validation failures and other statuses are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            Self::Validation { .. } => false,
        }
    }

    /// Returns the URL of the failed request.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::Validation { url, .. } => url,
        }
    }
}

/// Status codes that are worth another attempt.
const RETRYABLE_STATUSES: [u16; 10] = [408, 413, 429, 500, 502, 503, 504, 521, 522, 524];

/// Errors raised while configuring peer filters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The version range could not be parsed.
    #[error("invalid version range '{range}': {reason}")]
    InvalidVersionRange {
        /// The rejected range.
        range: String,
        /// Parser message.
        reason: String,
    },

    /// The sort direction is neither `asc` nor `desc`.
    #[error("invalid sort direction '{0}': expected 'asc' or 'desc'")]
    InvalidSortDirection(String),
}

/// Errors raised while parsing a `namespace/plugin` port key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginKeyError {
    /// The key has no `/` separator.
    #[error("plugin key '{0}' has no namespace separator")]
    MissingSeparator(String),

    /// The namespace or plugin segment is empty.
    #[error("plugin key '{0}' has an empty segment")]
    EmptySegment(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path of the config file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("invalid TOML: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
