//! Peer-list queries against a randomly chosen seed.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::{DEFAULT_BACKOFF_MS, DEFAULT_TIMEOUT_MS};
use crate::error::QueryError;
use crate::seeds::SeedSet;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{DataEnvelope, PeerRecord};

/// Retry policy for the peer-list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Allows `retries` extra attempts with the default backoff.
    #[must_use]
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }

    /// No retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Sets the base backoff. Zero retries immediately.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// What happens when a freshness verification request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPolicy {
    /// Any failed verification fails the whole call.
    #[default]
    FailFast,
    /// A peer whose verification fails is dropped from the result.
    ExcludeOnError,
}

/// Per-call options for discovery queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Retry policy for the peer-list fetch.
    pub retry: RetryPolicy,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Extra fields copied onto plugin results.
    pub additional: Vec<String>,
    /// Failure policy for freshness verification.
    pub verification: VerificationPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::none(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            additional: Vec::new(),
            verification: VerificationPolicy::default(),
        }
    }
}

impl QueryOptions {
    /// Default options: no retries, 3 second timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the retry count, keeping the current backoff.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry.retries = retries;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the extra fields copied onto plugin results.
    #[must_use]
    pub fn with_additional<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the freshness verification policy.
    #[must_use]
    pub fn with_verification_policy(mut self, policy: VerificationPolicy) -> Self {
        self.verification = policy;
        self
    }
}

/// Fetches the live peer list from one seed.
#[derive(Debug)]
pub struct PeerQueryClient<'a, T> {
    transport: &'a T,
    seeds: &'a SeedSet,
    peers_path: &'a str,
}

impl<'a, T: HttpTransport> PeerQueryClient<'a, T> {
    /// Creates a client over `seeds`, requesting `peers_path` on each.
    #[must_use]
    pub fn new(transport: &'a T, seeds: &'a SeedSet, peers_path: &'a str) -> Self {
        Self {
            transport,
            seeds,
            peers_path,
        }
    }

    /// Fetches peers from a randomly chosen seed, retrying per `options`.
    ///
    /// Every retry goes to the same seed. Errors are returned as-is.
    pub async fn fetch_peers(&self, options: &QueryOptions) -> Result<Vec<PeerRecord>, QueryError> {
        let seed = self.seeds.random();
        let url = endpoint(&seed.base_url(), self.peers_path)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            debug!(url = %url, attempt, "fetching peer list");

            let request = HttpRequest::get(url.clone()).peer_api();
            match get_json::<_, DataEnvelope<PeerRecord>>(self.transport, request, options.timeout).await {
                Ok(envelope) => {
                    debug!(url = %url, peers = envelope.data.len(), "fetched peer list");
                    return Ok(envelope.data);
                }
                Err(e) if attempt <= options.retry.retries && e.is_retryable() => {
                    let delay = options.retry.delay_for(attempt);
                    warn!(
                        url = %url,
                        attempt,
                        retries = options.retry.retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "peer list fetch failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Joins a peer base URL and an absolute path.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url, QueryError> {
    let raw = format!("{base}{path}");
    Url::parse(&raw).map_err(|e| QueryError::Validation {
        url: raw.clone(),
        reason: format!("invalid peer address: {e}"),
    })
}

/// Sends one request under `timeout` and decodes the JSON body.
pub(crate) async fn get_json<T, D>(transport: &T, request: HttpRequest, timeout: Duration) -> Result<D, QueryError>
where
    T: HttpTransport,
    D: DeserializeOwned,
{
    let url = request.url.clone();
    let response = tokio::time::timeout(timeout, transport.get(request))
        .await
        .map_err(|_| QueryError::Timeout {
            url: url.to_string(),
            timeout,
        })?
        .map_err(|source| QueryError::Transport {
            url: url.to_string(),
            source,
        })?;

    response.decode(&url)
}
