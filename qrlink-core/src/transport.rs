//! # Transports
//!
//! A [`Transport`] performs one raw exchange with a service: it knows how to reach the
//! service and how to move a [`WireRequest`] over the wire, nothing else. The
//! [`TransportAdapter`] wraps a transport with the per-call concerns: timeout, metrics
//! capture, and classification of the outcome into success or [`crate::error::CallError`].
pub mod adapter;
pub mod grpc;
pub mod http;

pub use adapter::{RawResponse, TransportAdapter};
pub use grpc::GrpcTransport;
pub use http::HttpTransport;

use crate::config::ServiceName;
use crate::error::NetworkErrorKind;
use serde_json::Value;

/// Protocol-level request produced by a translator.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: ::http::Method,
    /// Path relative to the service base address, without the query string.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl WireRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: ::http::Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: ::http::Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: ::http::Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Path plus query string, as recorded in the metrics log.
    pub fn endpoint(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// What came back from the wire, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    pub status: u16,
    pub body: Value,
    /// Size of the response payload as it travelled.
    pub size: usize,
}

/// The call never produced a response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: NetworkErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        service: ServiceName,
        request: &WireRequest,
    ) -> Result<WireResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_includes_query_string() {
        let request = WireRequest::get("/api/v1/url")
            .with_query("page", 2)
            .with_query("size", 10);
        assert_eq!(request.endpoint(), "/api/v1/url?page=2&size=10");

        let request = WireRequest::post("/v1/links", json!({"url": "https://a.b"}));
        assert_eq!(request.endpoint(), "/v1/links");
        assert_eq!(request.method, ::http::Method::POST);
    }
}
