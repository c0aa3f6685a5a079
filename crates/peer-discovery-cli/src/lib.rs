//! # peer-discovery-cli
//!
//! Command-line front-end for the `peer-discovery` library.
//!
//! Provides commands for:
//! - Listing the resolved seeds of a network
//! - Listing live peers, filtered by version and latency
//! - Listing the endpoints peers expose for a plugin
//! - Listing public API peers with an exact block count
//!
//! ```text
//! ┌────────────────┐   network / URL   ┌──────────────────┐
//! │ peer-discover  │──────────────────▶│  seeds (HTTP)    │
//! └────────────────┘                   └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use commands::DiscoverCommand;
pub use error::CliError;
pub use output::OutputFormat;
