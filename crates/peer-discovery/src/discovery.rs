//! The discovery entry point.

use std::sync::Arc;

use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, FilterError, QueryError};
use crate::filter::PeerQuery;
use crate::freshness::retain_exact_counts;
use crate::plugin::{PUBLIC_API_PLUGIN, PluginPortResolver};
use crate::query::{PeerQueryClient, QueryOptions};
use crate::rank::{SortDirection, SortKey};
use crate::seeds::{SeedResolver, SeedSet};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{Peer, PeerRecord};

/// Discovers live peers from a fixed set of seeds.
///
/// Seeds are resolved once at construction. Every `find_*` call fetches a
/// fresh peer list from a random seed and runs it through the current
/// [`PeerQuery`]. The fluent methods consume `self` and return a new
/// instance; clones share the seeds and the transport but each carries its
/// own query.
#[derive(Debug)]
pub struct PeerDiscovery<T = ReqwestTransport> {
    transport: Arc<T>,
    seeds: SeedSet,
    config: Arc<DiscoveryConfig>,
    query: PeerQuery,
}

impl<T> Clone for PeerDiscovery<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            seeds: self.seeds.clone(),
            config: Arc::clone(&self.config),
            query: self.query.clone(),
        }
    }
}

impl PeerDiscovery<ReqwestTransport> {
    /// Resolves seeds for a network name or URL with the default configuration.
    pub async fn new(network_or_host: &str) -> Result<Self, DiscoveryError> {
        Self::connect(network_or_host, DiscoveryConfig::default()).await
    }

    /// Resolves seeds for a network name or URL.
    pub async fn connect(network_or_host: &str, config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        Self::with_transport(ReqwestTransport::new(), network_or_host, config).await
    }
}

impl<T: HttpTransport> PeerDiscovery<T> {
    /// Resolves seeds over a custom transport.
    pub async fn with_transport(
        transport: T,
        network_or_host: &str,
        config: DiscoveryConfig,
    ) -> Result<Self, DiscoveryError> {
        config
            .validate()
            .map_err(|e| DiscoveryError::Failed(e.to_string()))?;

        let seeds = SeedResolver::new(&transport, &config)
            .resolve(network_or_host)
            .await?;

        Ok(Self::from_seeds(transport, seeds, config))
    }

    /// Builds an instance from already known seeds.
    #[must_use]
    pub fn from_seeds(transport: T, seeds: SeedSet, config: DiscoveryConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            seeds,
            config: Arc::new(config),
            query: PeerQuery::default(),
        }
    }

    /// Keeps only peers whose version satisfies `range`.
    pub fn with_version(mut self, range: &str) -> Result<Self, FilterError> {
        self.query = self.query.with_version(range)?;
        Ok(self)
    }

    /// Keeps only peers with latency at or below `max`.
    #[must_use]
    pub fn with_latency(mut self, max: f64) -> Self {
        self.query = self.query.with_latency(max);
        self
    }

    /// Orders results by `key` in `direction`.
    #[must_use]
    pub fn sort_by(mut self, key: impl Into<SortKey>, direction: SortDirection) -> Self {
        self.query = self.query.sort_by(key, direction);
        self
    }

    /// Replaces the whole query.
    #[must_use]
    pub fn with_query(mut self, query: PeerQuery) -> Self {
        self.query = query;
        self
    }

    /// The current query.
    #[must_use]
    pub fn query(&self) -> &PeerQuery {
        &self.query
    }

    /// The resolved seeds.
    #[must_use]
    pub fn seeds(&self) -> &[Peer] {
        self.seeds.as_slice()
    }

    /// The configuration this instance was built with.
    #[must_use]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Query options taken from the configuration.
    #[must_use]
    pub fn default_options(&self) -> QueryOptions {
        self.config.query_options()
    }

    /// Fetches, filters and ranks peers with the current query.
    pub async fn find_peers(&self, options: &QueryOptions) -> Result<Vec<PeerRecord>, QueryError> {
        self.find_peers_matching(&self.query, options).await
    }

    /// Fetches, filters and ranks peers with an explicit query.
    pub async fn find_peers_matching(
        &self,
        query: &PeerQuery,
        options: &QueryOptions,
    ) -> Result<Vec<PeerRecord>, QueryError> {
        let client = PeerQueryClient::new(self.transport.as_ref(), &self.seeds, &self.config.peers_path);
        let peers = client.fetch_peers(options).await?;
        Ok(query.apply(peers))
    }

    /// Finds peers exposing plugin `name`, as `{ip, port}` plus `options.additional`.
    pub async fn find_peers_with_plugin(&self, name: &str, options: &QueryOptions) -> Result<Vec<Peer>, QueryError> {
        let records = self.find_peers(options).await?;
        Ok(PluginPortResolver::new(name, &options.additional).resolve(&records))
    }

    /// Finds public API peers whose block count is not an estimate.
    pub async fn find_peers_without_estimates(&self, options: &QueryOptions) -> Result<Vec<Peer>, QueryError> {
        let peers = self.find_peers_with_plugin(PUBLIC_API_PLUGIN, options).await?;
        debug!(
            candidates = peers.len(),
            policy = ?options.verification,
            "verifying public API peers"
        );
        retain_exact_counts(self.transport.as_ref(), peers, &self.config.blocks_path, options).await
    }
}
