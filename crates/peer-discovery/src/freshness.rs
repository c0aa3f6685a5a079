//! Freshness checks for public API peers.
//!
//! A peer whose block index is still catching up reports its block count as
//! an estimate. Each candidate is asked for a single block and kept only if
//! `meta.totalCountIsEstimate` is not set.

use futures::future::{join_all, try_join_all};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::query::{QueryOptions, VerificationPolicy, endpoint, get_json};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::Peer;

#[derive(Debug, Deserialize)]
struct BlocksPage {
    meta: BlocksMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlocksMeta {
    #[serde(default)]
    total_count_is_estimate: bool,
}

/// Asks one peer whether its block count is an estimate.
async fn is_estimate<T: HttpTransport>(
    transport: &T,
    peer: &Peer,
    blocks_path: &str,
    options: &QueryOptions,
) -> Result<bool, QueryError> {
    let mut url = endpoint(&peer.base_url(), blocks_path)?;
    url.query_pairs_mut().append_pair("limit", "1");

    let page: BlocksPage = get_json(transport, HttpRequest::get(url).peer_api(), options.timeout).await?;
    Ok(page.meta.total_count_is_estimate)
}

/// Keeps the peers whose block count is exact, in input order.
///
/// All checks run concurrently. Under [`VerificationPolicy::FailFast`] the
/// first failed check fails the call; under
/// [`VerificationPolicy::ExcludeOnError`] the failing peer is dropped.
pub async fn retain_exact_counts<T: HttpTransport>(
    transport: &T,
    peers: Vec<Peer>,
    blocks_path: &str,
    options: &QueryOptions,
) -> Result<Vec<Peer>, QueryError> {
    let checks = peers
        .iter()
        .map(|peer| is_estimate(transport, peer, blocks_path, options));

    let verdicts: Vec<Option<bool>> = match options.verification {
        VerificationPolicy::FailFast => try_join_all(checks).await?.into_iter().map(Some).collect(),
        VerificationPolicy::ExcludeOnError => join_all(checks)
            .await
            .into_iter()
            .map(|result| match result {
                Ok(estimate) => Some(estimate),
                Err(e) => {
                    warn!(url = e.url(), error = %e, "freshness check failed, excluding peer");
                    None
                }
            })
            .collect(),
    };

    let candidates = peers.len();
    let fresh: Vec<Peer> = peers
        .into_iter()
        .zip(verdicts)
        .filter_map(|(peer, verdict)| match verdict {
            Some(false) => Some(peer),
            Some(true) => {
                debug!(peer = %peer, "excluding peer with estimated block count");
                None
            }
            None => None,
        })
        .collect();

    debug!(candidates, fresh = fresh.len(), "verified peer freshness");
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::{FakeTransport, Reply};
    use serde_json::json;

    fn blocks(estimate: bool) -> serde_json::Value {
        json!({"meta": {"totalCountIsEstimate": estimate, "count": 1}, "data": []})
    }

    fn peers() -> Vec<Peer> {
        vec![
            Peer::new("1.1.1.1", 4103),
            Peer::new("2.2.2.2", 4103),
            Peer::new("3.3.3.3", 4103),
        ]
    }

    #[tokio::test]
    async fn test_keeps_exact_counts_in_order() {
        let fake = FakeTransport::new()
            .json("http://1.1.1.1:4103/api/blocks?limit=1", &blocks(false))
            .json("http://2.2.2.2:4103/api/blocks?limit=1", &blocks(true))
            .json("http://3.3.3.3:4103/api/blocks?limit=1", &blocks(false));

        let fresh = retain_exact_counts(&fake, peers(), "/api/blocks", &QueryOptions::new())
            .await
            .expect("verified");

        assert_eq!(fresh, vec![Peer::new("1.1.1.1", 4103), Peer::new("3.3.3.3", 4103)]);
    }

    #[tokio::test]
    async fn test_missing_flag_counts_as_exact() {
        let fake = FakeTransport::new().json("http://1.1.1.1:4103/api/blocks?limit=1", &json!({"meta": {}}));

        let fresh = retain_exact_counts(&fake, vec![Peer::new("1.1.1.1", 4103)], "/api/blocks", &QueryOptions::new())
            .await
            .expect("verified");
        assert_eq!(fresh.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_fast_propagates_any_failure() {
        let fake = FakeTransport::new()
            .json("http://1.1.1.1:4103/api/blocks?limit=1", &blocks(false))
            .status("http://2.2.2.2:4103/api/blocks?limit=1", 500)
            .json("http://3.3.3.3:4103/api/blocks?limit=1", &blocks(false));

        let err = retain_exact_counts(&fake, peers(), "/api/blocks", &QueryOptions::new())
            .await
            .expect_err("fails");
        assert!(matches!(err, QueryError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_exclude_on_error_drops_failing_peer() {
        let fake = FakeTransport::new()
            .json("http://1.1.1.1:4103/api/blocks?limit=1", &blocks(false))
            .route("http://2.2.2.2:4103/api/blocks?limit=1", Reply::Fail("refused".into()))
            .json("http://3.3.3.3:4103/api/blocks?limit=1", &json!({"unexpected": true}));

        let options = QueryOptions::new().with_verification_policy(VerificationPolicy::ExcludeOnError);
        let fresh = retain_exact_counts(&fake, peers(), "/api/blocks", &options)
            .await
            .expect("best effort");

        assert_eq!(fresh, vec![Peer::new("1.1.1.1", 4103)]);
    }

    #[tokio::test]
    async fn test_requests_every_peer_once() {
        let fake = FakeTransport::new()
            .json("http://1.1.1.1:4103/api/blocks?limit=1", &blocks(false))
            .json("http://2.2.2.2:4103/api/blocks?limit=1", &blocks(false))
            .json("http://3.3.3.3:4103/api/blocks?limit=1", &blocks(false));

        retain_exact_counts(&fake, peers(), "/api/blocks", &QueryOptions::new())
            .await
            .expect("verified");

        assert_eq!(fake.requests().len(), 3);
        assert_eq!(fake.requests_to("http://2.2.2.2:4103/api/blocks?limit=1"), 1);
    }

    #[tokio::test]
    async fn test_no_peers_no_requests() {
        let fake = FakeTransport::new();
        let fresh = retain_exact_counts(&fake, Vec::new(), "/api/blocks", &QueryOptions::new())
            .await
            .expect("empty");
        assert!(fresh.is_empty());
        assert!(fake.requests().is_empty());
    }
}
