//! Plugin port resolution.
//!
//! Peers advertise optional services under `namespace/plugin` keys, for
//! example `@arkecosystem/core-wallet-api`. This module parses those keys and
//! maps a logical plugin name to the endpoint a peer exposes for it.

use std::fmt;

use crate::error::PluginKeyError;
use crate::types::{Peer, PeerRecord};

/// Separator between namespace and plugin name in a port key.
pub const PLUGIN_KEY_SEPARATOR: char = '/';

/// Plugin serving the extended wallet API.
pub const WALLET_API_PLUGIN: &str = "core-wallet-api";

/// Plugin serving the public base API.
pub const PUBLIC_API_PLUGIN: &str = "core-api";

/// A parsed `namespace/plugin` port key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginKey<'a> {
    namespace: &'a str,
    plugin: &'a str,
}

impl<'a> PluginKey<'a> {
    /// Parses a key of the form `namespace/plugin`.
    ///
    /// The split happens at the first separator, so the plugin segment may
    /// itself contain `/`.
    pub fn parse(key: &'a str) -> Result<Self, PluginKeyError> {
        let (namespace, plugin) = key
            .split_once(PLUGIN_KEY_SEPARATOR)
            .ok_or_else(|| PluginKeyError::MissingSeparator(key.to_string()))?;

        if namespace.is_empty() || plugin.is_empty() {
            return Err(PluginKeyError::EmptySegment(key.to_string()));
        }

        Ok(Self { namespace, plugin })
    }

    /// The namespace segment, e.g. `@arkecosystem`.
    #[must_use]
    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    /// The plugin segment, e.g. `core-api`.
    #[must_use]
    pub fn plugin(&self) -> &'a str {
        self.plugin
    }
}

impl fmt::Display for PluginKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, PLUGIN_KEY_SEPARATOR, self.plugin)
    }
}

/// Maps peers to the endpoint they expose for one plugin.
#[derive(Debug, Clone)]
pub struct PluginPortResolver<'a> {
    plugin: &'a str,
    additional: &'a [String],
}

impl<'a> PluginPortResolver<'a> {
    /// Creates a resolver for `plugin`, copying the `additional` fields.
    #[must_use]
    pub fn new(plugin: &'a str, additional: &'a [String]) -> Self {
        Self { plugin, additional }
    }

    /// Resolves a single peer, or `None` if it does not expose the plugin.
    ///
    /// An `additional` field named `ip` or `port` overwrites the endpoint address.
    #[must_use]
    pub fn resolve_one(&self, record: &PeerRecord) -> Option<Peer> {
        let port = record.ports.exposed_plugin_port(self.plugin)?;

        let mut peer = Peer::new(record.ip.clone(), port);
        for name in self.additional {
            if let Some(value) = record.field(name) {
                peer.set_field(name, value);
            }
        }
        Some(peer)
    }

    /// Resolves every peer that exposes the plugin, keeping input order.
    #[must_use]
    pub fn resolve(&self, records: &[PeerRecord]) -> Vec<Peer> {
        let peers: Vec<Peer> = records.iter().filter_map(|r| self.resolve_one(r)).collect();

        tracing::debug!(
            plugin = self.plugin,
            candidates = records.len(),
            exposed = peers.len(),
            "resolved plugin ports"
        );

        peers
    }
}
