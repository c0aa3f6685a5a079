//! # peer-discovery
//!
//! Pull-based peer discovery for gossiping node networks.
//!
//! Starting from a network name (looked up in a manifest of known peers) or a
//! URL serving a peer list, this crate resolves a fixed set of seeds, then on
//! every call asks one random seed for its live peer list, filters it by
//! version and latency, ranks it, and optionally maps it to the endpoints
//! peers expose for a given plugin.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │     Seed     │   │  Peer Query  │   │    Filter    │   │    Plugin    │
//! │   Resolver   │──▶│    Client    │──▶│   + Ranker   │──▶│ Port Resolver│
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!   once, at            every call,        version,           port lookup,
//!   construction        random seed        latency, sort      freshness check
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use peer_discovery::{PeerDiscovery, QueryOptions, SortDirection};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = PeerDiscovery::new("mainnet")
//!     .await?
//!     .with_version(">=2.6.0")?
//!     .with_latency(300.0)
//!     .sort_by("latency", SortDirection::Asc);
//!
//! let peers = discovery.find_peers(&QueryOptions::new().with_retries(2)).await?;
//! let wallets = discovery
//!     .find_peers_with_plugin("core-wallet-api", &QueryOptions::new())
//!     .await?;
//! # let _ = (peers, wallets);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Seed resolution reports every failure as [`DiscoveryError`]. Queries
//! return [`QueryError`] unchanged, so timeouts, statuses and transport
//! failures stay distinguishable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod freshness;
pub mod plugin;
pub mod query;
pub mod rank;
pub mod seeds;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::DiscoveryConfig;
pub use discovery::PeerDiscovery;
pub use error::{ConfigError, DiscoveryError, FilterError, PluginKeyError, QueryError, TransportError};
pub use filter::{PeerQuery, VersionConstraint};
pub use plugin::{PUBLIC_API_PLUGIN, PluginKey, PluginPortResolver, WALLET_API_PLUGIN};
pub use query::{PeerQueryClient, QueryOptions, RetryPolicy, VerificationPolicy};
pub use rank::{SortDirection, SortKey, SortOrder};
pub use seeds::{SeedResolver, SeedSet, SeedSource};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{Peer, PeerRecord, PluginPorts, exposed_port};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::DiscoveryConfig;
    pub use crate::discovery::PeerDiscovery;
    pub use crate::filter::PeerQuery;
    pub use crate::query::{QueryOptions, RetryPolicy, VerificationPolicy};
    pub use crate::rank::SortDirection;
    pub use crate::types::{Peer, PeerRecord};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
