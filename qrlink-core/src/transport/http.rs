//! JSON over HTTP, used by every REST client and by the transcoded RPC wire.
use super::{Transport, TransportError, WireRequest, WireResponse};
use crate::config::{EndpointRegistry, Protocol, ServiceName};
use crate::error::NetworkErrorKind;
use serde_json::Value;
use tracing::trace;

pub struct HttpTransport {
    client: reqwest::Client,
    registry: EndpointRegistry,
    protocol: Protocol,
}

impl HttpTransport {
    /// Addresses services through `registry`'s entries for `protocol`.
    pub fn new(registry: EndpointRegistry, protocol: Protocol) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry,
            protocol,
        }
    }

    fn url(&self, service: ServiceName, request: &WireRequest) -> Result<String, TransportError> {
        let base = self
            .registry
            .base_address(self.protocol, service)
            .ok_or_else(|| {
                TransportError::new(
                    NetworkErrorKind::Unreachable,
                    format!("No {} address configured for {service}", self.protocol),
                )
            })?;
        Ok(format!("{}{}", base.trim_end_matches('/'), request.path))
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        service: ServiceName,
        request: &WireRequest,
    ) -> Result<WireResponse, TransportError> {
        let url = self.url(service, request)?;
        trace!(method = %request.method, %url, "sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(classify)?;

        Ok(WireResponse {
            status,
            body: parse_body(&bytes),
            size: bytes.len(),
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        NetworkErrorKind::Timeout
    } else if err.is_connect() {
        NetworkErrorKind::Unreachable
    } else {
        NetworkErrorKind::Transport
    };
    TransportError::new(kind, err.to_string())
}

/// JSON when it parses, the raw text otherwise, `null` when empty.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_parsing_falls_back_to_text() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(br#"{"success":true}"#), json!({"success": true}));
        assert_eq!(parse_body(b"Not Found"), json!("Not Found"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let transport = HttpTransport::new(EndpointRegistry::default(), Protocol::Rest);
        let request = WireRequest::get("/api/v1/url/abc");
        let url = transport.url(ServiceName::UrlShortener, &request).unwrap();
        assert_eq!(url, "http://localhost:8083/api/v1/url/abc");
    }

    #[test]
    fn missing_address_is_unreachable() {
        let transport = HttpTransport::new(EndpointRegistry::empty(), Protocol::Rpc);
        let err = transport
            .url(ServiceName::QrGenerator, &WireRequest::get("/health"))
            .unwrap_err();
        assert_eq!(err.kind, NetworkErrorKind::Unreachable);
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let address = "http://127.0.0.1:1";
        let registry =
            EndpointRegistry::empty().with(Protocol::Rest, ServiceName::Analytics, address);
        let transport = HttpTransport::new(registry, Protocol::Rest);
        let err = transport
            .execute(ServiceName::Analytics, &WireRequest::get("/health"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, NetworkErrorKind::Unreachable);
    }
}
