//! Command-line argument parsing with clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use peer_discovery::{DiscoveryConfig, SortDirection};

use crate::error::CliError;

/// Peer discovery CLI - find live peers of a node network.
#[derive(Parser, Debug, Clone)]
#[command(name = "peer-discover")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Network name (e.g. `mainnet`) or URL serving a peer list.
    #[arg(short, long, env = "PEER_DISCOVERY_TARGET", default_value = "mainnet")]
    pub target: String,

    /// TOML configuration file.
    #[arg(short, long, env = "PEER_DISCOVERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the seed manifest repository.
    #[arg(long, env = "PEER_DISCOVERY_MANIFEST_URL")]
    pub manifest_url: Option<String>,

    /// Port for seeds that do not advertise an API port.
    #[arg(long)]
    pub default_port: Option<u16>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Retries of the peer-list fetch.
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Builds the discovery configuration: file (or defaults), then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result is invalid.
    pub fn discovery_config(&self) -> Result<DiscoveryConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => DiscoveryConfig::from_file(path)?,
            None => DiscoveryConfig::default(),
        };

        if let Some(url) = &self.manifest_url {
            config = config.with_manifest_base_url(url.clone());
        }
        if let Some(port) = self.default_port {
            config = config.with_default_port(port);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Sort direction argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DirectionArg {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl From<DirectionArg> for SortDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Asc => Self::Asc,
            DirectionArg::Desc => Self::Desc,
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the resolved seeds.
    Seeds,

    /// List live peers, filtered and sorted.
    Peers(PeerArgs),

    /// List the endpoints peers expose for a plugin.
    Plugin(PluginArgs),

    /// List public API peers whose block count is exact.
    Fresh(FreshArgs),
}

/// Filter and sort arguments shared by peer listings.
#[derive(Parser, Debug, Clone, Default)]
pub struct PeerArgs {
    /// Version range peers must satisfy (e.g. `>=2.6.0`).
    #[arg(long = "version-range", value_name = "RANGE")]
    pub version_range: Option<String>,

    /// Maximum latency in milliseconds.
    #[arg(long)]
    pub max_latency: Option<f64>,

    /// Field to sort by.
    #[arg(long, default_value = "latency")]
    pub sort_by: String,

    /// Sort direction.
    #[arg(long, value_enum, default_value_t = DirectionArg::Desc)]
    pub direction: DirectionArg,
}

/// Arguments for the plugin command.
#[derive(Parser, Debug, Clone)]
pub struct PluginArgs {
    /// Plugin name, e.g. `core-wallet-api`.
    pub name: String,

    /// Extra peer fields to include (comma-separated).
    #[arg(short, long, value_delimiter = ',')]
    pub additional: Vec<String>,

    /// Filters applied before the plugin lookup.
    #[command(flatten)]
    pub peers: PeerArgs,
}

/// Arguments for the fresh command.
#[derive(Parser, Debug, Clone)]
pub struct FreshArgs {
    /// Drop peers whose check fails instead of failing the command.
    #[arg(long)]
    pub exclude_on_error: bool,

    /// Extra peer fields to include (comma-separated).
    #[arg(short, long, value_delimiter = ',')]
    pub additional: Vec<String>,

    /// Filters applied before the freshness check.
    #[command(flatten)]
    pub peers: PeerArgs,
}
