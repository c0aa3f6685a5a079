//! Discovery configuration.
//!
//! Everything here has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! default_port = 4003
//! timeout_ms = 3000
//! retries = 0
//! verification_policy = "fail_fast"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::query::{QueryOptions, RetryPolicy, VerificationPolicy};

/// Default base URL of the per-network seed manifests.
pub const DEFAULT_MANIFEST_BASE_URL: &str = "https://raw.githubusercontent.com/ArkEcosystem/peers/master";

/// Default port assigned to seeds that do not advertise a usable API port.
pub const DEFAULT_PORT: u16 = 4003;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Default base delay between retries in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 300;

/// Default peer-list path.
pub const DEFAULT_PEERS_PATH: &str = "/api/peers";

/// Default block-list path used for freshness checks.
pub const DEFAULT_BLOCKS_PATH: &str = "/api/blocks";

/// Configuration for a discovery instance and the defaults of its queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Base URL holding `<network>.json` seed manifests.
    pub manifest_base_url: String,
    /// Port given to seeds without a usable advertised API port.
    pub default_port: u16,
    /// Path of the peer-list endpoint on each seed.
    pub peers_path: String,
    /// Path of the block-list endpoint used for freshness checks.
    pub blocks_path: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retries of the peer-list fetch.
    pub retries: u32,
    /// Base delay between retries in milliseconds.
    pub backoff_ms: u64,
    /// How failed freshness checks are treated.
    pub verification_policy: VerificationPolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            manifest_base_url: DEFAULT_MANIFEST_BASE_URL.to_string(),
            default_port: DEFAULT_PORT,
            peers_path: DEFAULT_PEERS_PATH.to_string(),
            blocks_path: DEFAULT_BLOCKS_PATH.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: 0,
            backoff_ms: DEFAULT_BACKOFF_MS,
            verification_policy: VerificationPolicy::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().display().to_string(),
            source,
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_port == 0 {
            return Err(ConfigError::Invalid("default_port must be in 1-65535".to_string()));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be greater than zero".to_string()));
        }

        self.manifest_base()?;

        for (name, path) in [("peers_path", &self.peers_path), ("blocks_path", &self.blocks_path)] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!("{name} must start with '/'")));
            }
        }

        Ok(())
    }

    /// Sets the default seed port.
    #[must_use]
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Sets the manifest base URL.
    #[must_use]
    pub fn with_manifest_base_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the retry count and backoff.
    #[must_use]
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Sets the freshness verification policy.
    #[must_use]
    pub fn with_verification_policy(mut self, policy: VerificationPolicy) -> Self {
        self.verification_policy = policy;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Query options derived from this configuration.
    #[must_use]
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new()
            .with_timeout(self.timeout())
            .with_retry(RetryPolicy::new(self.retries).with_backoff(Duration::from_millis(self.backoff_ms)))
            .with_verification_policy(self.verification_policy)
    }

    /// Manifest base URL with a trailing slash, so joins append to the path.
    pub fn manifest_base(&self) -> Result<Url, ConfigError> {
        let mut base = self.manifest_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        let url = Url::parse(&base)
            .map_err(|e| ConfigError::Invalid(format!("manifest_base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("manifest_base_url must be http or https".to_string()));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.default_port, 4003);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.retries, 0);
        assert_eq!(config.verification_policy, VerificationPolicy::FailFast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = DiscoveryConfig::from_toml("").expect("empty config");
        assert_eq!(config, DiscoveryConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = DiscoveryConfig::from_toml(
            r#"
            default_port = 4001
            timeout_ms = 1500
            retries = 2
            verification_policy = "exclude_on_error"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.default_port, 4001);
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.retries, 2);
        assert_eq!(config.verification_policy, VerificationPolicy::ExcludeOnError);
        assert_eq!(config.peers_path, DEFAULT_PEERS_PATH);
    }

    #[test]
    fn test_invalid_toml() {
        let err = DiscoveryConfig::from_toml("default_port = \"four\"").expect_err("type error");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let err = DiscoveryConfig::default().with_default_port(0).validate().expect_err("zero port");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_bad_manifest_url() {
        let config = DiscoveryConfig::default().with_manifest_base_url("ftp://example.com");
        assert!(config.validate().is_err());

        let config = DiscoveryConfig::default().with_manifest_base_url("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_paths() {
        let config = DiscoveryConfig {
            peers_path: "api/peers".to_string(),
            ..DiscoveryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_manifest_base_gets_trailing_slash() {
        let base = DiscoveryConfig::default().manifest_base().expect("valid base");
        let joined = base.join("mainnet.json").expect("join");
        assert_eq!(
            joined.as_str(),
            "https://raw.githubusercontent.com/ArkEcosystem/peers/master/mainnet.json"
        );
    }

    #[test]
    fn test_query_options_follow_config() {
        let config = DiscoveryConfig::default().with_retries(3, Duration::ZERO);
        let options = config.query_options();
        assert_eq!(options.retry.retries, 3);
        assert_eq!(options.retry.backoff, Duration::ZERO);
        assert_eq!(options.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "default_port = 4001").expect("write");

        let config = DiscoveryConfig::from_file(file.path()).expect("load");
        assert_eq!(config.default_port, 4001);
    }

    #[test]
    fn test_from_missing_file() {
        let err = DiscoveryConfig::from_file("/nonexistent/peer-discovery.toml").expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
