//! Core peer types shared by every stage of the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plugin::PluginKey;

/// Returns the port if `value` is a usable TCP port (1–65535).
///
/// Peers advertise `-1` (or any other out-of-range value) for plugins that
/// are installed but not exposed.
#[must_use]
pub fn exposed_port(value: i64) -> Option<u16> {
    u16::try_from(value).ok().filter(|port| *port != 0)
}

/// Plugin ports advertised by a peer, keyed by `namespace/plugin`.
///
/// Keys keep the order the peer advertised them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginPorts(Map<String, Value>);

impl PluginPorts {
    /// Creates an empty port map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a port entry.
    #[must_use]
    pub fn with_port(mut self, key: impl Into<String>, port: i64) -> Self {
        self.0.insert(key.into(), Value::from(port));
        self
    }

    /// Returns the advertised value for a full key, if it is an integer.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Iterates over `(key, advertised value)` pairs in advertised order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of advertised entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is advertised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finds the advertised value for the first key whose plugin segment is `plugin`.
    ///
    /// Keys are searched in advertised order and the first match wins, even
    /// when its value is not a usable port. Keys that are not in
    /// `namespace/plugin` form never match.
    #[must_use]
    pub fn find_plugin(&self, plugin: &str) -> Option<i64> {
        let (_, value) = self.0.iter().find(|(key, _)| match PluginKey::parse(key) {
            Ok(parsed) => parsed.plugin() == plugin,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "skipping malformed plugin key");
                false
            }
        })?;
        value.as_i64()
    }

    /// Finds the exposed port of a plugin, if it is advertised and in range.
    #[must_use]
    pub fn exposed_plugin_port(&self, plugin: &str) -> Option<u16> {
        self.find_plugin(plugin).and_then(exposed_port)
    }
}

/// A network peer address with optional capability data.
///
/// Seeds and plugin endpoints are `Peer`s; anything beyond the addressing
/// key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// IP address or host name.
    pub ip: String,
    /// Port to address the peer on.
    pub port: u16,
    /// Advertised plugin ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<PluginPorts>,
    /// Reported software version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Reported latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Peer {
    /// Creates a peer with only an address.
    #[must_use]
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
            ports: None,
            version: None,
            latency: None,
            extra: Map::new(),
        }
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the latency.
    #[must_use]
    pub fn with_latency(mut self, latency: f64) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Copies a named field onto this peer.
    ///
    /// Typed fields (`ip`, `port`, `version`, `latency`, `ports`) are
    /// overwritten when the value has the right shape and left untouched
    /// otherwise, so a typed name never lands in [`Peer::extra`]. Everything
    /// else goes to [`Peer::extra`].
    pub fn set_field(&mut self, name: &str, value: Value) {
        let applied = match name {
            "ip" => match value {
                Value::String(ip) => {
                    self.ip = ip;
                    true
                }
                _ => false,
            },
            "port" => match value.as_u64().and_then(|port| u16::try_from(port).ok()) {
                Some(port) => {
                    self.port = port;
                    true
                }
                None => false,
            },
            "version" => match value {
                Value::String(version) => {
                    self.version = Some(version);
                    true
                }
                _ => false,
            },
            "latency" => match value.as_f64() {
                Some(latency) => {
                    self.latency = Some(latency);
                    true
                }
                None => false,
            },
            "ports" => match serde_json::from_value::<PluginPorts>(value) {
                Ok(ports) => {
                    self.ports = Some(ports);
                    true
                }
                Err(_) => false,
            },
            _ => {
                self.extra.insert(name.to_string(), value);
                true
            }
        };

        if !applied {
            tracing::debug!(field = name, "ignoring field with unexpected shape");
        }
    }

    /// Base URL (`http://ip:port`) of this peer.
    #[must_use]
    pub fn base_url(&self) -> String {
        base_url(&self.ip, self.port)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", host_port(&self.ip, self.port))
    }
}

/// A peer as reported by a peer-list endpoint.
///
/// Unlike [`Peer`], version, latency and plugin ports are mandatory; a
/// response missing any of them is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// IP address or host name.
    pub ip: String,
    /// Peer-to-peer port.
    pub port: u16,
    /// Advertised plugin ports.
    pub ports: PluginPorts,
    /// Reported software version.
    pub version: String,
    /// Reported latency in milliseconds.
    pub latency: f64,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PeerRecord {
    /// Creates a record with no plugin ports and no extra fields.
    #[must_use]
    pub fn new(ip: impl Into<String>, port: u16, version: impl Into<String>, latency: f64) -> Self {
        Self {
            ip: ip.into(),
            port,
            ports: PluginPorts::new(),
            version: version.into(),
            latency,
            extra: Map::new(),
        }
    }

    /// Sets the plugin ports.
    #[must_use]
    pub fn with_ports(mut self, ports: PluginPorts) -> Self {
        self.ports = ports;
        self
    }

    /// Adds an extra field.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Looks up any field by its wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ip" => Some(Value::from(self.ip.clone())),
            "port" => Some(Value::from(self.port)),
            "version" => Some(Value::from(self.version.clone())),
            "latency" => Some(Value::from(self.latency)),
            "ports" => serde_json::to_value(&self.ports).ok(),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Converts into a general [`Peer`], keeping every field.
    #[must_use]
    pub fn into_peer(self) -> Peer {
        Peer {
            ip: self.ip,
            port: self.port,
            ports: Some(self.ports),
            version: Some(self.version),
            latency: Some(self.latency),
            extra: self.extra,
        }
    }

    /// Base URL (`http://ip:port`) of this peer.
    #[must_use]
    pub fn base_url(&self) -> String {
        base_url(&self.ip, self.port)
    }
}

impl fmt::Display for PeerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{}, {}ms)", host_port(&self.ip, self.port), self.version, self.latency)
    }
}

/// The `{ "data": [...] }` envelope used by peer and seed endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub(crate) data: Vec<T>,
}

fn host_port(ip: &str, port: u16) -> String {
    if ip.contains(':') && !ip.starts_with('[') {
        format!("[{ip}]:{port}")
    } else {
        format!("{ip}:{port}")
    }
}

pub(crate) fn base_url(ip: &str, port: u16) -> String {
    format!("http://{}", host_port(ip, port))
}
