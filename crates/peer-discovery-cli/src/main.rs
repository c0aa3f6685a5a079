//! `peer-discover` binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use peer_discovery::PeerDiscovery;
use peer_discovery_cli::{Cli, DiscoverCommand, OutputFormat};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.discovery_config()?;
    tracing::debug!(network_or_host = %cli.target, ?config, "starting discovery");

    let discovery = PeerDiscovery::connect(&cli.target, config)
        .await
        .with_context(|| format!("resolving seeds for {}", cli.target))?;

    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();
    DiscoverCommand::new(discovery)
        .execute(&mut stdout, &format, &cli.command)
        .await?;

    Ok(())
}
