//! Shared helpers for integration tests.

#![allow(dead_code)]

use peer_discovery::ReqwestTransport;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A `reqwest` transport that never goes through a proxy.
pub fn direct_transport() -> ReqwestTransport {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("build reqwest client");
    ReqwestTransport::with_client(client)
}

/// Port the mock server listens on.
pub fn port(server: &MockServer) -> u16 {
    server.address().port()
}

/// Answers every `GET` to `route` with `body`.
pub async fn mount_json(server: &MockServer, route: &str, body: &Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Number of requests received for `route`.
pub async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

/// Peer-list payload where every peer's API plugins point back at `port`.
pub fn peer_list(port: u16) -> Value {
    json!({"data": [
        {
            "ip": "127.0.0.1",
            "port": 4001,
            "ports": {
                "@arkecosystem/core-wallet-api": port,
                "@arkecosystem/core-api": port
            },
            "version": "2.5.0",
            "latency": 200,
            "height": 1000
        },
        {
            "ip": "127.0.0.1",
            "port": 4002,
            "ports": {
                "@arkecosystem/core-wallet-api": -1,
                "@arkecosystem/core-api": port
            },
            "version": "2.6.0",
            "latency": 100,
            "height": 1001
        }
    ]})
}

/// Seed payload advertising the mock server's port as the public API.
pub fn hosted_seeds(port: u16) -> Value {
    json!({"data": [
        {"ip": "127.0.0.1", "ports": {"@arkecosystem/core-api": port}}
    ]})
}
