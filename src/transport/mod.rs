//! Transport trait and implementations for talking to the vault
//!
//! The primary transport is blocking HTTP via `reqwest`, but the trait allows
//! for alternative implementations like an in-memory mock (for testing).

mod http;

pub use http::HttpTransport;

use crate::Result;

/// HTTP methods used by the vault API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A single request to the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL, without query string
    pub url: String,
    pub query: Vec<(&'static str, &'static str)>,
    /// Raw value for the `Authorization` header
    pub authorization: Option<String>,
    /// JSON-encoded body
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            authorization: None,
            body: None,
        }
    }

    pub fn query(mut self, key: &'static str, value: &'static str) -> Self {
        self.query.push((key, value));
        self
    }

    pub fn authorization(mut self, token: impl Into<String>) -> Self {
        self.authorization = Some(token.into());
        self
    }

    /// Attach a value serialized as JSON
    pub fn json<T: serde::Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }
}

/// A fully-read response from the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport trait for executing vault requests.
///
/// Implementations must read the whole response body before returning so
/// that no connection outlives the call.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}
