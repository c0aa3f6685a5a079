//! Deterministic peer ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::FilterError;
use crate::filter::parse_version;
use crate::types::PeerRecord;

/// Field a peer list is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Reported latency, numerically.
    #[default]
    Latency,
    /// Reported version, by semantic version precedence.
    Version,
    /// Any other field, by its JSON value.
    Field(String),
}

impl From<&str> for SortKey {
    fn from(key: &str) -> Self {
        match key {
            "latency" => Self::Latency,
            "version" => Self::Version,
            other => Self::Field(other.to_string()),
        }
    }
}

impl From<String> for SortKey {
    fn from(key: String) -> Self {
        Self::from(key.as_str())
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latency => write!(f, "latency"),
            Self::Version => write!(f, "version"),
            Self::Field(name) => write!(f, "{name}"),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(FilterError::InvalidSortDirection(s.to_string())),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// A sort key plus direction. Defaults to latency, descending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortOrder {
    /// Field to order by.
    pub key: SortKey,
    /// Direction to order in.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Creates a sort order.
    #[must_use]
    pub fn new(key: impl Into<SortKey>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// Sorts peers in place. The sort is stable: ties keep their input order.
    pub fn rank(&self, peers: &mut [PeerRecord]) {
        peers.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    /// Ascending comparison of two peers by this order's key.
    #[must_use]
    pub fn compare(&self, a: &PeerRecord, b: &PeerRecord) -> Ordering {
        match &self.key {
            SortKey::Latency => a.latency.total_cmp(&b.latency),
            SortKey::Version => compare_versions(&a.version, &b.version),
            SortKey::Field(name) => compare_missing_last(a.field(name).as_ref(), b.field(name).as_ref()),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.direction)
    }
}

/// Parseable versions order by precedence and come before unparseable ones.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

// Missing values sort after present ones.
fn compare_missing_last(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
