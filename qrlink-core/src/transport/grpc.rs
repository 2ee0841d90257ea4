//! Native gRPC wire for RPC clients.
//!
//! Translators always speak in terms of the JSON transcoding routes. This transport resolves a
//! [`WireRequest`] to the RPC method bound to its route, calls it over HTTP/2 with the dynamic
//! JSON codec, and answers like the transcoding gateway would: a JSON message on success, a
//! `{code, message, details}` body with the mapped HTTP status otherwise.
use super::{Transport, TransportError, WireRequest, WireResponse};
use crate::BoxError;
use crate::config::{ConfigError, EndpointRegistry, Protocol, ServiceName};
use crate::error::NetworkErrorKind;
use crate::grpc::client::{GrpcClient, GrpcRequestError};
use crate::transcoding::{TranscodingTable, http_status, merge_path_params, status_body};
use http_body::Body as HttpBody;
use serde_json::json;
use std::collections::HashMap;
use tonic::Code;
use tonic::transport::{Channel, Endpoint};
use tracing::trace;

pub struct GrpcTransport<S = Channel> {
    clients: HashMap<ServiceName, GrpcClient<S>>,
    table: TranscodingTable,
}

/// Fully qualified RPC service hosted by `service`, if it hosts one.
pub fn rpc_service(service: ServiceName) -> Option<&'static str> {
    match service {
        ServiceName::UrlShortener => Some(qrlink_proto::LINK_SHORTENER_SERVICE),
        ServiceName::QrGenerator => Some(qrlink_proto::QR_CODE_SERVICE),
        ServiceName::UserManagement | ServiceName::Analytics => None,
    }
}

impl GrpcTransport<Channel> {
    /// Creates lazily connected channels to the RPC addresses of the services hosting an RPC
    /// service. Nothing is dialed until the first call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect_lazy(registry: &EndpointRegistry) -> Result<Self, ConfigError> {
        let mut clients = HashMap::new();

        for (service, address) in registry.services(Protocol::Rpc) {
            if rpc_service(service).is_none() {
                continue;
            }
            let endpoint = Endpoint::from_shared(address.to_string()).map_err(|e| {
                ConfigError::InvalidAddress {
                    service,
                    address: address.to_string(),
                    reason: e.to_string(),
                }
            })?;
            clients.insert(service, GrpcClient::new(endpoint.connect_lazy()));
        }

        Ok(Self {
            clients,
            table: TranscodingTable::load()?,
        })
    }
}

impl<S> GrpcTransport<S>
where
    S: tonic::client::GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Routes every RPC-capable service to the same underlying gRPC service.
    ///
    /// Handy with an in-process `tonic::service::Routes` hosting both RPC services.
    pub fn from_service(service: S) -> Result<Self, ConfigError> {
        let clients = ServiceName::ALL
            .into_iter()
            .filter(|s| rpc_service(*s).is_some())
            .map(|s| (s, GrpcClient::new(service.clone())))
            .collect();

        Ok(Self {
            clients,
            table: TranscodingTable::load()?,
        })
    }
}

#[async_trait::async_trait]
impl<S> Transport for GrpcTransport<S>
where
    S: tonic::client::GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    async fn execute(
        &self,
        service: ServiceName,
        request: &WireRequest,
    ) -> Result<WireResponse, TransportError> {
        let resolved = self
            .table
            .resolve(&request.method, &request.path)
            .filter(|(binding, _)| Some(binding.rule.service) == rpc_service(service));

        let Some((binding, params)) = resolved else {
            let message = format!("No RPC method bound to {} {}", request.method, request.path);
            let body = json!({ "code": Code::NotFound as i32, "message": message, "details": [] });
            return Ok(WireResponse {
                status: 404,
                size: body.to_string().len(),
                body,
            });
        };

        let mut client = self.clients.get(&service).cloned().ok_or_else(|| {
            TransportError::new(
                NetworkErrorKind::Unreachable,
                format!("No RPC address configured for {service}"),
            )
        })?;

        let message = merge_path_params(request.body.clone(), params);
        trace!(method = %binding.method.full_name(), %message, "sending gRPC request");

        match client.unary(binding.method.clone(), message).await {
            Ok(Ok(decoded)) => Ok(WireResponse {
                status: 200,
                body: decoded.value,
                size: decoded.wire_size,
            }),
            Ok(Err(status)) if status.code() == Code::Unavailable => Err(TransportError::new(
                NetworkErrorKind::Unreachable,
                status.message().to_string(),
            )),
            Ok(Err(status)) if status.code() == Code::DeadlineExceeded => Err(
                TransportError::new(NetworkErrorKind::Timeout, status.message().to_string()),
            ),
            Ok(Err(status)) => Ok(WireResponse {
                status: http_status(status.code()),
                body: status_body(&status),
                size: status.message().len(),
            }),
            Err(GrpcRequestError::ClientNotReady(e)) => Err(TransportError::new(
                NetworkErrorKind::Unreachable,
                e.to_string(),
            )),
            Err(e) => Err(TransportError::new(
                NetworkErrorKind::Transport,
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_link_and_qr_services_host_rpc() {
        assert!(rpc_service(ServiceName::UrlShortener).is_some());
        assert!(rpc_service(ServiceName::QrGenerator).is_some());
        assert!(rpc_service(ServiceName::Analytics).is_none());
    }

    #[tokio::test]
    async fn unbound_route_answers_not_found_without_dialing() {
        let transport = GrpcTransport::connect_lazy(&EndpointRegistry::default()).unwrap();

        let response = transport
            .execute(
                ServiceName::UrlShortener,
                &WireRequest::get("/api/v1/url/abc/stats"),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body["code"], 5);

        // A QR route sent to the URL shortener is not bound either.
        let response = transport
            .execute(
                ServiceName::UrlShortener,
                &WireRequest::post("/v1/qrcode/encode", json!({"url": "x"})),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn refused_connection_is_not_a_success() {
        let address = "http://127.0.0.1:1";
        let registry =
            EndpointRegistry::empty().with(Protocol::Rpc, ServiceName::UrlShortener, address);
        let transport = GrpcTransport::connect_lazy(&registry).unwrap();

        match transport
            .execute(ServiceName::UrlShortener, &WireRequest::get("/abc123"))
            .await
        {
            Err(err) => assert_ne!(err.kind, NetworkErrorKind::Timeout),
            Ok(response) => assert!(response.status >= 500),
        }
    }
}
