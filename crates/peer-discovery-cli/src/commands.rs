//! Command implementations.

use std::io::Write;

use peer_discovery::{HttpTransport, PeerDiscovery, PeerQuery, QueryOptions, VerificationPolicy};

use crate::cli::{Commands, FreshArgs, PeerArgs, PluginArgs};
use crate::error::CliError;
use crate::output::{EndpointList, OutputFormat, PeerList, SeedList};

/// Builds the filter and sort state for a peer listing.
///
/// # Errors
///
/// Returns an error if the version range does not parse.
pub fn peer_query(args: &PeerArgs) -> Result<PeerQuery, CliError> {
    let mut query = PeerQuery::new().sort_by(args.sort_by.as_str(), args.direction.into());
    if let Some(range) = &args.version_range {
        query = query.with_version(range)?;
    }
    if let Some(max) = args.max_latency {
        query = query.with_latency(max);
    }
    Ok(query)
}

/// Runs subcommands against one resolved discovery instance.
pub struct DiscoverCommand<T> {
    discovery: PeerDiscovery<T>,
}

impl<T: HttpTransport> DiscoverCommand<T> {
    /// Create a command runner.
    #[must_use]
    pub fn new(discovery: PeerDiscovery<T>) -> Self {
        Self { discovery }
    }

    /// Execute a subcommand, writing its result to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is invalid, the query fails or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &Commands,
    ) -> Result<(), CliError> {
        match command {
            Commands::Seeds => format.write(writer, &SeedList(self.discovery.seeds().to_vec())),
            Commands::Peers(args) => {
                let peers = self.peers(args).await?;
                format.write(writer, &PeerList(peers))
            }
            Commands::Plugin(args) => {
                let endpoints = self.plugin(args).await?;
                format.write(writer, &EndpointList(endpoints))
            }
            Commands::Fresh(args) => {
                let endpoints = self.fresh(args).await?;
                format.write(writer, &EndpointList(endpoints))
            }
        }
    }

    async fn peers(&self, args: &PeerArgs) -> Result<Vec<peer_discovery::PeerRecord>, CliError> {
        let query = peer_query(args)?;
        let options = self.discovery.default_options();
        Ok(self.discovery.find_peers_matching(&query, &options).await?)
    }

    async fn plugin(&self, args: &PluginArgs) -> Result<Vec<peer_discovery::Peer>, CliError> {
        let discovery = self.discovery.clone().with_query(peer_query(&args.peers)?);
        let options = discovery.default_options().with_additional(args.additional.iter().cloned());
        Ok(discovery.find_peers_with_plugin(&args.name, &options).await?)
    }

    async fn fresh(&self, args: &FreshArgs) -> Result<Vec<peer_discovery::Peer>, CliError> {
        let discovery = self.discovery.clone().with_query(peer_query(&args.peers)?);
        let mut options = discovery.default_options().with_additional(args.additional.iter().cloned());
        if args.exclude_on_error {
            options = options.with_verification_policy(VerificationPolicy::ExcludeOnError);
        }
        Ok(discovery.find_peers_without_estimates(&options).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{DirectionArg, Format};
    use peer_discovery::{
        DiscoveryConfig, HttpRequest, HttpResponse, Peer, SeedSet, SortDirection, SortKey, TransportError,
    };
    use serde_json::json;
    use std::collections::HashMap;

    /// Fake transport answering from a fixed URL table.
    struct FakeTransport {
        routes: HashMap<String, serde_json::Value>,
    }

    impl HttpTransport for FakeTransport {
        async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.routes
                .get(request.url.as_str())
                .map(HttpResponse::json)
                .ok_or_else(|| TransportError::Connect(format!("no route for {}", request.url)))
        }
    }

    fn discovery() -> PeerDiscovery<FakeTransport> {
        let routes = HashMap::from([
            (
                "http://1.1.1.1:4003/api/peers".to_string(),
                json!({"data": [
                    {
                        "ip": "2.2.2.2",
                        "port": 4001,
                        "ports": {"@arkecosystem/core-wallet-api": 4140, "@arkecosystem/core-api": 4103},
                        "version": "2.6.0",
                        "latency": 100,
                        "height": 120
                    },
                    {
                        "ip": "3.3.3.3",
                        "port": 4001,
                        "ports": {"@arkecosystem/core-api": 4103},
                        "version": "2.5.0",
                        "latency": 200
                    }
                ]}),
            ),
            (
                "http://2.2.2.2:4103/api/blocks?limit=1".to_string(),
                json!({"meta": {"totalCountIsEstimate": false}}),
            ),
            (
                "http://3.3.3.3:4103/api/blocks?limit=1".to_string(),
                json!({"meta": {"totalCountIsEstimate": true}}),
            ),
        ]);

        let seeds = SeedSet::new(vec![Peer::new("1.1.1.1", 4003)]).expect("seed");
        PeerDiscovery::from_seeds(FakeTransport { routes }, seeds, DiscoveryConfig::default())
    }

    async fn run(command: Commands) -> serde_json::Value {
        let mut buf = Vec::new();
        DiscoverCommand::new(discovery())
            .execute(&mut buf, &OutputFormat::new(Format::Json), &command)
            .await
            .expect("command succeeds");
        serde_json::from_slice(&buf).expect("json output")
    }

    fn peer_args() -> PeerArgs {
        PeerArgs {
            sort_by: "latency".to_string(),
            ..PeerArgs::default()
        }
    }

    #[test]
    fn peer_query_from_args() {
        let args = PeerArgs {
            version_range: Some(">=2.6.0".into()),
            max_latency: Some(150.0),
            sort_by: "version".into(),
            direction: DirectionArg::Asc,
        };

        let query = peer_query(&args).expect("valid");
        assert_eq!(query.max_latency(), Some(150.0));
        assert_eq!(query.sort().key, SortKey::Version);
        assert_eq!(query.sort().direction, SortDirection::Asc);
        assert!(query.version().is_some());
    }

    #[test]
    fn peer_query_rejects_bad_range() {
        let args = PeerArgs {
            version_range: Some("not a range".into()),
            ..peer_args()
        };
        assert!(matches!(peer_query(&args), Err(CliError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn seeds_command_lists_seeds() {
        let out = run(Commands::Seeds).await;
        assert_eq!(out, json!([{"ip": "1.1.1.1", "port": 4003}]));
    }

    #[tokio::test]
    async fn peers_command_filters() {
        let args = PeerArgs {
            max_latency: Some(150.0),
            ..peer_args()
        };
        let out = run(Commands::Peers(args)).await;

        let ips: Vec<&str> = out
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|p| p["ip"].as_str())
            .collect();
        assert_eq!(ips, vec!["2.2.2.2"]);
    }

    #[tokio::test]
    async fn plugin_command_resolves_ports() {
        let out = run(Commands::Plugin(PluginArgs {
            name: "core-wallet-api".into(),
            additional: vec!["height".into()],
            peers: peer_args(),
        }))
        .await;

        assert_eq!(out, json!([{"ip": "2.2.2.2", "port": 4140, "height": 120}]));
    }

    #[tokio::test]
    async fn fresh_command_drops_estimates() {
        let out = run(Commands::Fresh(FreshArgs {
            exclude_on_error: false,
            additional: Vec::new(),
            peers: peer_args(),
        }))
        .await;

        assert_eq!(out, json!([{"ip": "2.2.2.2", "port": 4103}]));
    }
}
