//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use peer_discovery::{Peer, PeerRecord};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Seed addresses.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SeedList(pub Vec<Peer>);

impl TableDisplay for SeedList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:<40}  {:>5}", "IP", "PORT")?;
        writeln!(writer, "{}", "─".repeat(47))?;
        for seed in &self.0 {
            writeln!(writer, "{:<40}  {:>5}", seed.ip, seed.port)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} seed(s)", self.0.len())?;
        Ok(())
    }
}

/// Live peers as reported by a seed.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PeerList(pub Vec<PeerRecord>);

impl TableDisplay for PeerList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_empty() {
            writeln!(writer, "No peers matched")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<40}  {:>5}  {:<12}  {:>12}",
            "IP", "PORT", "VERSION", "LATENCY (ms)"
        )?;
        writeln!(writer, "{}", "─".repeat(75))?;
        for peer in &self.0 {
            writeln!(
                writer,
                "{:<40}  {:>5}  {:<12}  {:>12}",
                peer.ip, peer.port, peer.version, peer.latency
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} peer(s)", self.0.len())?;
        Ok(())
    }
}

/// Plugin endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct EndpointList(pub Vec<Peer>);

impl TableDisplay for EndpointList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_empty() {
            writeln!(writer, "No peers expose this plugin")?;
            return Ok(());
        }

        writeln!(writer, "{:<40}  {:>5}  EXTRA", "IP", "PORT")?;
        writeln!(writer, "{}", "─".repeat(60))?;
        for peer in &self.0 {
            writeln!(writer, "{:<40}  {:>5}  {}", peer.ip, peer.port, extra_fields(peer))?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} endpoint(s)", self.0.len())?;
        Ok(())
    }
}

/// Copied fields as `key=value` pairs.
fn extra_fields(peer: &Peer) -> String {
    let mut fields = Vec::new();
    if let Some(version) = &peer.version {
        fields.push(format!("version={version}"));
    }
    if let Some(latency) = peer.latency {
        fields.push(format!("latency={latency}"));
    }
    fields.extend(peer.extra.iter().map(|(key, value)| format!("{key}={value}")));
    fields.join(" ")
}
