//! # Protocol-agnostic clients
//!
//! [`ClientFactory::create`] turns a [`Protocol`] into a [`ClientSet`]: one client per
//! service, each exposing the full logical operation set. Protocol branching happens here,
//! once. Every operation is bound either to the translator of the active protocol or to
//! [`Binding::Unsupported`], which fails fast with
//! [`CallError::CapabilityUnsupported`](crate::error::CallError::CapabilityUnsupported)
//! without touching the network.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qrlink_core::client::{ClientFactory, ShortenUrl};
//! use qrlink_core::config::{ClientConfig, Protocol};
//! use qrlink_core::metrics::MetricsLog;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let log = Arc::new(MetricsLog::new());
//! let clients = ClientFactory::create(Protocol::Rpc, &ClientConfig::default(), log.clone())?;
//!
//! let result = clients
//!     .url_shortener
//!     .shorten_url(&ShortenUrl::new("https://example.com"))
//!     .await?;
//! println!("{} in {} ms", result.payload["shortCode"], result.metrics.duration_millis);
//! # Ok(())
//! # }
//! ```
pub mod analytics;
pub mod qr_generator;
pub mod translate;
mod types;
pub mod url_shortener;

pub use analytics::Analytics;
pub use qr_generator::QrGenerator;
pub use translate::{Binding, Normalized, RestTranslator, Translator};
pub use types::*;
pub use url_shortener::UrlShortener;

use crate::config::{ClientConfig, ConfigError, EndpointRegistry, Protocol, RpcWire, ServiceName};
use crate::metrics::MetricsSink;
use crate::transport::{GrpcTransport, HttpTransport, Transport, TransportAdapter};
use std::sync::Arc;
use std::time::Duration;

/// The clients of every service, bound to one protocol.
pub struct ClientSet {
    pub protocol: Protocol,
    pub url_shortener: UrlShortener,
    pub qr_generator: QrGenerator,
    pub analytics: Analytics,
}

pub struct ClientFactory;

impl ClientFactory {
    /// Builds the clients for `protocol`. No network I/O happens here.
    ///
    /// Under RPC with [`RpcWire::Native`], the URL shortener and the QR generator talk gRPC
    /// over lazily connected channels, so this must run inside a Tokio runtime. Health
    /// checks always go over HTTP.
    pub fn create(
        protocol: Protocol,
        config: &ClientConfig,
        sink: Arc<dyn MetricsSink>,
    ) -> Result<ClientSet, ConfigError> {
        let http: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config.endpoints.clone(), protocol));

        let operations: Arc<dyn Transport> = match (protocol, config.rpc_wire) {
            (Protocol::Rpc, RpcWire::Native) => {
                Arc::new(GrpcTransport::connect_lazy(&config.endpoints)?)
            }
            _ => http.clone(),
        };

        Ok(Self::assemble(
            protocol,
            &config.endpoints,
            operations,
            http,
            config.timeout(),
            sink,
        ))
    }

    /// Builds the clients on top of an arbitrary transport, used for every call.
    pub fn with_transport(
        protocol: Protocol,
        registry: &EndpointRegistry,
        transport: Arc<dyn Transport>,
        timeout: Duration,
        sink: Arc<dyn MetricsSink>,
    ) -> ClientSet {
        Self::assemble(
            protocol,
            registry,
            transport.clone(),
            transport,
            timeout,
            sink,
        )
    }

    fn assemble(
        protocol: Protocol,
        registry: &EndpointRegistry,
        operations: Arc<dyn Transport>,
        health: Arc<dyn Transport>,
        timeout: Duration,
        sink: Arc<dyn MetricsSink>,
    ) -> ClientSet {
        let adapter = Arc::new(TransportAdapter::new(
            protocol,
            operations,
            timeout,
            sink.clone(),
        ));
        let health_adapter = Arc::new(TransportAdapter::new(protocol, health, timeout, sink));

        let rpc_base_address = registry
            .base_address(Protocol::Rpc, ServiceName::UrlShortener)
            .unwrap_or_default();
        let services = registry
            .services(protocol)
            .map(|(service, _)| service)
            .collect();

        ClientSet {
            protocol,
            url_shortener: UrlShortener::new(adapter.clone(), rpc_base_address),
            qr_generator: QrGenerator::new(adapter),
            analytics: Analytics::new(health_adapter, services),
        }
    }
}
