//! Peer filtering and the immutable query state.
//!
//! A [`PeerQuery`] is a frozen snapshot of the optional version and latency
//! filters plus the sort order. Its builder methods consume and return the
//! query, so a value handed to a running discovery call can never change
//! underneath it.

use std::fmt;

use semver::{Version, VersionReq};

use crate::error::FilterError;
use crate::rank::{SortDirection, SortKey, SortOrder};
use crate::types::PeerRecord;

/// A semantic version range such as `>=2.5.0`, `2.6.0` or `^2 || ~3.1`.
///
/// Comparators may be separated by spaces or commas, `||` separates
/// alternatives, `a - b` is an inclusive range and a bare version means an
/// exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionConstraint {
    /// Parses a range expression.
    pub fn parse(range: &str) -> Result<Self, FilterError> {
        let invalid = |reason: String| FilterError::InvalidVersionRange {
            range: range.to_string(),
            reason,
        };

        if range.trim().is_empty() {
            return Err(invalid("range is empty".to_string()));
        }

        let alternatives = range
            .split("||")
            .map(|set| {
                let normalized = normalize_comparator_set(set);
                VersionReq::parse(&normalized).map_err(|e| invalid(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: range.trim().to_string(),
            alternatives,
        })
    }

    /// Returns true if `version` parses and satisfies any alternative.
    #[must_use]
    pub fn matches(&self, version: &str) -> bool {
        parse_version(version).is_some_and(|v| self.alternatives.iter().any(|req| req.matches(&v)))
    }

    /// The range as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Parses a reported peer version, ignoring surrounding space and a leading `v`.
pub(crate) fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Rewrites one comparator set into the comma-separated form `semver` parses.
fn normalize_comparator_set(set: &str) -> String {
    let set = set.trim();
    if set.is_empty() {
        return "*".to_string();
    }

    if let Some((low, high)) = set.split_once(" - ") {
        return format!(">={}, <={}", low.trim(), high.trim());
    }

    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in set.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending_op.push_str(token);
            continue;
        }
        let token = token.strip_prefix('v').unwrap_or(token);
        let comparator = format!("{pending_op}{token}");
        pending_op.clear();
        comparators.push(exact_if_bare(&comparator));
    }

    if comparators.is_empty() {
        return "*".to_string();
    }
    comparators.join(", ")
}

// `semver` reads a bare version as a caret requirement; here it means exact.
fn exact_if_bare(comparator: &str) -> String {
    let starts_with_digit = comparator.chars().next().is_some_and(|c| c.is_ascii_digit());
    let core = comparator.split(['-', '+']).next().unwrap_or(comparator);
    let has_wildcard = core.contains(['x', 'X', '*']);
    if starts_with_digit && !has_wildcard {
        format!("={comparator}")
    } else {
        comparator.to_string()
    }
}

/// Filter and sort state applied to every peer list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerQuery {
    version: Option<VersionConstraint>,
    max_latency: Option<f64>,
    sort: SortOrder,
}

impl PeerQuery {
    /// Creates a query with no filters, sorted by latency descending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only peers whose version satisfies `range`.
    ///
    /// An empty or blank range clears the version filter.
    pub fn with_version(mut self, range: &str) -> Result<Self, FilterError> {
        if range.trim().is_empty() {
            self.version = None;
            return Ok(self);
        }
        Ok(self.with_version_constraint(VersionConstraint::parse(range)?))
    }

    /// Keeps only peers whose version satisfies an already parsed constraint.
    #[must_use]
    pub fn with_version_constraint(mut self, constraint: VersionConstraint) -> Self {
        self.version = Some(constraint);
        self
    }

    /// Keeps only peers with latency at or below `max`.
    #[must_use]
    pub fn with_latency(mut self, max: f64) -> Self {
        self.max_latency = Some(max);
        self
    }

    /// Orders results by `key` in `direction`.
    #[must_use]
    pub fn sort_by(mut self, key: impl Into<SortKey>, direction: SortDirection) -> Self {
        self.sort = SortOrder::new(key, direction);
        self
    }

    /// The configured version constraint.
    #[must_use]
    pub fn version(&self) -> Option<&VersionConstraint> {
        self.version.as_ref()
    }

    /// The configured latency threshold.
    #[must_use]
    pub fn max_latency(&self) -> Option<f64> {
        self.max_latency
    }

    /// The configured sort order.
    #[must_use]
    pub fn sort(&self) -> &SortOrder {
        &self.sort
    }

    /// Returns true if `peer` passes every configured filter.
    #[must_use]
    pub fn accepts(&self, peer: &PeerRecord) -> bool {
        if let Some(constraint) = &self.version {
            if !constraint.matches(&peer.version) {
                return false;
            }
        }

        if let Some(max) = self.max_latency {
            if peer.latency > max {
                return false;
            }
        }

        true
    }

    /// Drops peers that fail a filter. Version is checked before latency.
    #[must_use]
    pub fn filter(&self, mut peers: Vec<PeerRecord>) -> Vec<PeerRecord> {
        peers.retain(|peer| self.accepts(peer));
        peers
    }

    /// Filters, then ranks.
    #[must_use]
    pub fn apply(&self, peers: Vec<PeerRecord>) -> Vec<PeerRecord> {
        let total = peers.len();
        let mut peers = self.filter(peers);
        self.sort.rank(&mut peers);

        tracing::debug!(
            total,
            kept = peers.len(),
            version = self.version.as_ref().map(VersionConstraint::as_str),
            max_latency = self.max_latency,
            sort = %self.sort,
            "applied peer query"
        );

        peers
    }
}
