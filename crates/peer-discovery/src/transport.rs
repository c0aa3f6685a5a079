//! HTTP transport seam.
//!
//! Discovery only ever issues JSON `GET`s. [`HttpTransport`] captures that so
//! the pipeline can run against [`ReqwestTransport`] in production and a
//! scripted fake in tests. Timeouts are enforced by the caller, not by the
//! transport.

use std::future::Future;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{QueryError, TransportError};

/// `Accept` header sent to peer API endpoints.
pub const PEER_API_ACCEPT: &str = "application/vnd.core-api.v2+json";

/// `Content-Type` header sent to peer API endpoints.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A `GET` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL.
    pub url: Url,
    /// Request headers.
    pub headers: Vec<(&'static str, &'static str)>,
}

impl HttpRequest {
    /// Creates a request with no headers.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Adds the JSON headers peer APIs expect.
    #[must_use]
    pub fn peer_api(self) -> Self {
        self.header("Accept", PEER_API_ACCEPT)
            .header("Content-Type", JSON_CONTENT_TYPE)
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a `200 OK` response with a JSON body.
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Checks the status, then decodes the body as `T`.
    pub fn decode<T: DeserializeOwned>(&self, url: &Url) -> Result<T, QueryError> {
        if !self.is_success() {
            return Err(QueryError::Status {
                url: url.to_string(),
                status: self.status,
            });
        }

        serde_json::from_slice(&self.body).map_err(|e| QueryError::Validation {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Issues `GET` requests for the discovery pipeline.
pub trait HttpTransport: Send + Sync {
    /// Sends a request and buffers the whole response.
    ///
    /// Non-2xx statuses are not errors at this layer.
    fn get(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(*name, *value);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
