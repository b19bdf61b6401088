//! Blocking HTTP transport
//!
//! Wraps a `reqwest` blocking client configured from the `[vault]` section of
//! the configuration file.

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::config::VaultConfig;
use crate::Result;

/// Transport backed by a blocking `reqwest` client
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new transport with the given configuration
    pub fn new(config: &VaultConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.request_timeout())
            .user_agent(concat!("pwv/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            query,
            authorization,
            body,
        } = request;

        let method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = authorization {
            builder = builder.header(AUTHORIZATION, token);
        }
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        // Consumes the response, releasing the connection on every path
        let body = response.bytes()?.to_vec();

        tracing::trace!(status, bytes = body.len(), "received vault response");

        Ok(HttpResponse { status, body })
    }
}
