//! # Client configuration
//!
//! The protocol selector, the logical service names, and the [`EndpointRegistry`] mapping
//! `(protocol, service)` to a base address. A [`ClientConfig`] can be loaded from a JSON
//! file; every field falls back to the defaults of the local development setup.
//!
//! ```json
//! {
//!   "timeoutMs": 10000,
//!   "rpcWire": "native",
//!   "endpoints": {
//!     "REST": { "urlShortener": "http://localhost:8083" },
//!     "RPC": { "urlShortener": "http://localhost:5001" }
//!   }
//! }
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Fixed per-call timeout applied by the transport adapter.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': '{source}'")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file '{path}': '{source}'")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid endpoint address '{address}' for {service}: '{reason}'")]
    InvalidAddress {
        service: ServiceName,
        address: String,
        reason: String,
    },
    #[error("Invalid timeoutMs: must be at least 1 millisecond")]
    ZeroTimeout,
    #[error("Failed to load the RPC schema: '{0}'")]
    Schema(#[from] crate::transcoding::TranscodingError),
}

/// The transport family a client session talks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "RPC", alias = "gRPC", alias = "grpc")]
    Rpc,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::Rest, Protocol::Rpc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Rest => "REST",
            Protocol::Rpc => "RPC",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "rest" => Ok(Protocol::Rest),
            "rpc" | "grpc" => Ok(Protocol::Rpc),
            _ => Err(format!(
                "Unknown protocol '{value}'. Expected 'rest' or 'rpc'"
            )),
        }
    }
}

/// Logical services known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceName {
    UrlShortener,
    QrGenerator,
    UserManagement,
    Analytics,
}

impl ServiceName {
    pub const ALL: [ServiceName; 4] = [
        ServiceName::UrlShortener,
        ServiceName::QrGenerator,
        ServiceName::UserManagement,
        ServiceName::Analytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::UrlShortener => "urlShortener",
            ServiceName::QrGenerator => "qrGenerator",
            ServiceName::UserManagement => "userManagement",
            ServiceName::Analytics => "analytics",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How RPC requests travel on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcWire {
    /// JSON over HTTP through the services' transcoding gateway.
    #[default]
    Transcoded,
    /// Protobuf over HTTP/2 (native gRPC).
    Native,
}

/// Static mapping from `(protocol, service)` to a base address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointRegistry(BTreeMap<Protocol, BTreeMap<ServiceName, String>>);

impl Default for EndpointRegistry {
    fn default() -> Self {
        let rest = [
            (ServiceName::UrlShortener, "http://localhost:8083"),
            (ServiceName::QrGenerator, "http://localhost:8082"),
            (ServiceName::UserManagement, "http://localhost:8080"),
            (ServiceName::Analytics, "http://localhost:8081"),
        ];
        // User management and analytics have no RPC flavour: RPC uses their REST endpoints.
        let rpc = [
            (ServiceName::UrlShortener, "http://localhost:5001"),
            (ServiceName::QrGenerator, "http://localhost:5003"),
            (ServiceName::UserManagement, "http://localhost:8080"),
            (ServiceName::Analytics, "http://localhost:8081"),
        ];

        let mut registry = Self(BTreeMap::new());
        for (service, address) in rest {
            registry.set(Protocol::Rest, service, address);
        }
        for (service, address) in rpc {
            registry.set(Protocol::Rpc, service, address);
        }
        registry
    }
}

impl EndpointRegistry {
    /// An empty registry. Mostly useful in tests together with [`EndpointRegistry::with`].
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, protocol: Protocol, service: ServiceName, address: &str) -> Self {
        self.set(protocol, service, address);
        self
    }

    fn set(&mut self, protocol: Protocol, service: ServiceName, address: &str) {
        self.0
            .entry(protocol)
            .or_default()
            .insert(service, address.trim_end_matches('/').to_string());
    }

    pub fn base_address(&self, protocol: Protocol, service: ServiceName) -> Option<&str> {
        self.0.get(&protocol)?.get(&service).map(String::as_str)
    }

    /// Services registered for `protocol`, with their base address.
    pub fn services(&self, protocol: Protocol) -> impl Iterator<Item = (ServiceName, &str)> {
        self.0
            .get(&protocol)
            .into_iter()
            .flat_map(|services| services.iter().map(|(s, a)| (*s, a.as_str())))
    }

    /// Overlays every entry of `other` on top of `self`.
    fn merge(&mut self, other: EndpointRegistry) {
        for (protocol, services) in other.0 {
            for (service, address) in services {
                self.set(protocol, service, &address);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for protocol in Protocol::ALL {
            for (service, address) in self.services(protocol) {
                let parsed = reqwest::Url::parse(address).map_err(|e| {
                    ConfigError::InvalidAddress {
                        service,
                        address: address.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidAddress {
                        service,
                        address: address.to_string(),
                        reason: "scheme must be http or https".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Everything a [`crate::client::ClientFactory`] needs to build clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub endpoints: EndpointRegistry,
    pub timeout_ms: u64,
    pub rpc_wire: RpcWire,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointRegistry::default(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            rpc_wire: RpcWire::default(),
        }
    }
}

/// On-disk shape: every field optional, endpoints overlay the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    endpoints: Option<EndpointRegistry>,
    timeout_ms: Option<u64>,
    rpc_wire: Option<RpcWire>,
}

impl ClientConfig {
    /// Loads a config file, overlaying its entries on the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;

        let mut config = Self::default();
        if let Some(endpoints) = file.endpoints {
            config.endpoints.merge(endpoints);
        }
        if let Some(timeout_ms) = file.timeout_ms {
            if timeout_ms == 0 {
                return Err(ConfigError::ZeroTimeout);
            }
            config.timeout_ms = timeout_ms;
        }
        if let Some(rpc_wire) = file.rpc_wire {
            config.rpc_wire = rpc_wire;
        }
        config.endpoints.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_endpoints(mut self, endpoints: EndpointRegistry) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_rpc_wire(mut self, rpc_wire: RpcWire) -> Self {
        self.rpc_wire = rpc_wire;
        self
    }
}
