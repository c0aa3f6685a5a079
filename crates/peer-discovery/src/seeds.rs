//! Seed resolution.
//!
//! A discovery instance starts from either a network name, looked up in a
//! manifest of known peers, or an explicit URL serving a peer list. Any
//! failure along the way is reported as one [`DiscoveryError::Failed`]; a
//! source that answers with no peers is [`DiscoveryError::NoSeeds`].

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::plugin::{PUBLIC_API_PLUGIN, WALLET_API_PLUGIN};
use crate::query::get_json;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{DataEnvelope, Peer, PluginPorts};

/// A non-empty, immutable list of bootstrap peers.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSet(Arc<[Peer]>);

impl SeedSet {
    /// Creates a seed set, failing with [`DiscoveryError::NoSeeds`] when empty.
    pub fn new(seeds: Vec<Peer>) -> Result<Self, DiscoveryError> {
        if seeds.is_empty() {
            return Err(DiscoveryError::NoSeeds);
        }
        Ok(Self(seeds.into()))
    }

    /// The seeds in resolution order.
    #[must_use]
    pub fn as_slice(&self) -> &[Peer] {
        &self.0
    }

    /// Number of seeds. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Picks a seed uniformly at random.
    #[must_use]
    pub fn random(&self) -> &Peer {
        let index = rand::thread_rng().gen_range(0..self.0.len());
        &self.0[index]
    }
}

/// Where seeds come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// A URL serving `{ "data": [...] }`.
    Url(Url),
    /// A network name looked up in the manifest repository.
    Network(String),
}

impl SeedSource {
    /// Classifies `input` as a URL or a network name.
    ///
    /// Only `http` and `https` URLs count as URLs. Anything else must be a
    /// plain name: no whitespace, `/` or `:`.
    pub fn parse(input: &str) -> Result<Self, DiscoveryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DiscoveryError::Failed("network or host must not be empty".to_string()));
        }

        if let Ok(url) = Url::parse(trimmed) {
            if matches!(url.scheme(), "http" | "https") && url.has_host() {
                return Ok(Self::Url(url));
            }
        }

        if trimmed.contains(|c: char| c.is_whitespace() || c == '/' || c == ':') {
            return Err(DiscoveryError::Failed(format!(
                "'{trimmed}' is neither an http(s) URL nor a network name"
            )));
        }

        Ok(Self::Network(trimmed.to_string()))
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Network(name) => write!(f, "network '{name}'"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    ip: String,
}

#[derive(Debug, Deserialize)]
struct HostedSeedEntry {
    ip: String,
    #[serde(default)]
    ports: PluginPorts,
}

/// Resolves a network name or URL into a [`SeedSet`].
#[derive(Debug)]
pub struct SeedResolver<'a, T> {
    transport: &'a T,
    config: &'a DiscoveryConfig,
}

impl<'a, T: HttpTransport> SeedResolver<'a, T> {
    /// Creates a resolver.
    #[must_use]
    pub fn new(transport: &'a T, config: &'a DiscoveryConfig) -> Self {
        Self { transport, config }
    }

    /// Fetches the seeds for `network_or_host`.
    pub async fn resolve(&self, network_or_host: &str) -> Result<SeedSet, DiscoveryError> {
        let source = SeedSource::parse(network_or_host)?;
        debug!(source = %source, "resolving seeds");

        let seeds = match &source {
            SeedSource::Url(url) => self.from_url(url).await?,
            SeedSource::Network(name) => self.from_manifest(name).await?,
        };

        let seeds = SeedSet::new(seeds)?;
        info!(source = %source, seeds = seeds.len(), "resolved seeds");
        Ok(seeds)
    }

    /// Every manifest entry gets the default port.
    async fn from_manifest(&self, network: &str) -> Result<Vec<Peer>, DiscoveryError> {
        let url = self
            .config
            .manifest_base()
            .and_then(|base| {
                base.join(&format!("{network}.json"))
                    .map_err(|e| crate::error::ConfigError::Invalid(e.to_string()))
            })
            .map_err(|e| DiscoveryError::Failed(e.to_string()))?;

        let entries: Vec<ManifestEntry> = get_json(self.transport, HttpRequest::get(url), self.config.timeout())
            .await
            .map_err(|e| DiscoveryError::Failed(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|entry| Peer::new(entry.ip, self.config.default_port))
            .collect())
    }

    /// Prefers the wallet API port, then the public API port, then the default.
    async fn from_url(&self, url: &Url) -> Result<Vec<Peer>, DiscoveryError> {
        let envelope: DataEnvelope<HostedSeedEntry> =
            get_json(self.transport, HttpRequest::get(url.clone()), self.config.timeout())
                .await
                .map_err(|e| DiscoveryError::Failed(e.to_string()))?;

        Ok(envelope
            .data
            .into_iter()
            .map(|entry| {
                let port = entry
                    .ports
                    .exposed_plugin_port(WALLET_API_PLUGIN)
                    .or_else(|| entry.ports.exposed_plugin_port(PUBLIC_API_PLUGIN))
                    .unwrap_or(self.config.default_port);
                Peer::new(entry.ip, port)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use serde_json::json;
    use test_case::test_case;

    const MAINNET: &str = "https://raw.githubusercontent.com/ArkEcosystem/peers/master/mainnet.json";
    const HOSTED: &str = "https://seeds.example.com/api/peers";

    #[test_case("mainnet" ; "plain")]
    #[test_case("  devnet  " ; "padded")]
    #[test_case("test-net_2" ; "punctuation")]
    fn test_source_network(input: &str) {
        assert_eq!(
            SeedSource::parse(input).ok(),
            Some(SeedSource::Network(input.trim().to_string()))
        );
    }

    #[test]
    fn test_source_url() {
        let source = SeedSource::parse(HOSTED).expect("url");
        assert!(matches!(source, SeedSource::Url(url) if url.as_str() == HOSTED));
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("main net" ; "whitespace")]
    #[test_case("ftp://seeds.example.com" ; "non http scheme")]
    #[test_case("localhost:4003" ; "host port without scheme")]
    #[test_case("../mainnet" ; "path")]
    fn test_source_rejects(input: &str) {
        assert!(matches!(SeedSource::parse(input), Err(DiscoveryError::Failed(_))));
    }

    #[test]
    fn test_empty_seed_set_rejected() {
        assert!(matches!(SeedSet::new(Vec::new()), Err(DiscoveryError::NoSeeds)));
    }

    #[tokio::test]
    async fn test_network_manifest_uses_default_port() {
        let fake = FakeTransport::new().json(
            MAINNET,
            &json!([{"ip": "1.1.1.1", "port": 4001}, {"ip": "2.2.2.2", "port": 4001}]),
        );
        let config = DiscoveryConfig::default();

        let seeds = SeedResolver::new(&fake, &config).resolve("mainnet").await.expect("seeds");
        assert_eq!(
            seeds.as_slice(),
            &[Peer::new("1.1.1.1", 4003), Peer::new("2.2.2.2", 4003)]
        );
    }

    #[tokio::test]
    async fn test_network_manifest_custom_default_port() {
        let fake = FakeTransport::new().json(MAINNET, &json!([{"ip": "1.1.1.1"}]));
        let config = DiscoveryConfig::default().with_default_port(4001);

        let seeds = SeedResolver::new(&fake, &config).resolve("mainnet").await.expect("seeds");
        assert_eq!(seeds.as_slice(), &[Peer::new("1.1.1.1", 4001)]);
    }

    #[tokio::test]
    async fn test_hosted_port_preference() {
        let fake = FakeTransport::new().json(
            HOSTED,
            &json!({"data": [
                {"ip": "1.1.1.1", "ports": {
                    "@arkecosystem/core-wallet-api": 4140,
                    "@arkecosystem/core-api": 4103
                }},
                {"ip": "2.2.2.2", "ports": {
                    "@arkecosystem/core-wallet-api": -1,
                    "@arkecosystem/core-api": 4103
                }},
                {"ip": "3.3.3.3", "ports": {"@arkecosystem/core-api": -1}},
                {"ip": "4.4.4.4"}
            ]}),
        );
        let config = DiscoveryConfig::default();

        let seeds = SeedResolver::new(&fake, &config).resolve(HOSTED).await.expect("seeds");
        assert_eq!(
            seeds.as_slice(),
            &[
                Peer::new("1.1.1.1", 4140),
                Peer::new("2.2.2.2", 4103),
                Peer::new("3.3.3.3", 4003),
                Peer::new("4.4.4.4", 4003),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let fake = FakeTransport::new().status(
            "https://raw.githubusercontent.com/ArkEcosystem/peers/master/failnet.json",
            404,
        );
        let config = DiscoveryConfig::default();

        let err = SeedResolver::new(&fake, &config).resolve("failnet").await.expect_err("fails");
        assert!(matches!(err, DiscoveryError::Failed(msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_bad_json_fails() {
        let fake = FakeTransport::new().json(HOSTED, &json!({"peers": []}));
        let config = DiscoveryConfig::default();

        let err = SeedResolver::new(&fake, &config).resolve(HOSTED).await.expect_err("fails");
        assert!(matches!(err, DiscoveryError::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_result_is_no_seeds() {
        let fake = FakeTransport::new().json(MAINNET, &json!([]));
        let config = DiscoveryConfig::default();

        let err = SeedResolver::new(&fake, &config).resolve("mainnet").await.expect_err("fails");
        assert!(matches!(err, DiscoveryError::NoSeeds));
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_request() {
        let fake = FakeTransport::new();
        let config = DiscoveryConfig::default();

        let err = SeedResolver::new(&fake, &config).resolve("").await.expect_err("fails");
        assert!(matches!(err, DiscoveryError::Failed(_)));
        assert!(fake.requests().is_empty());
    }

    #[test]
    fn test_random_stays_in_set() {
        let seeds = SeedSet::new(vec![Peer::new("1.1.1.1", 4003), Peer::new("2.2.2.2", 4003)])
            .expect("non-empty");
        for _ in 0..32 {
            assert!(seeds.as_slice().contains(seeds.random()));
        }
    }
}
