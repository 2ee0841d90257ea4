//! # qrlink Core
//!
//! `qrlink-core` lets calling code issue a logical operation ("shorten a URL", "generate a
//! QR code") without knowing whether the transport underneath is REST/JSON or RPC, while
//! capturing latency, payload size and status code for every call.
//!
//! ## Key Components
//!
//! * **[`client::ClientFactory`]:** Builds a [`client::ClientSet`] for a [`config::Protocol`].
//!   Each member exposes the full logical operation set of one service.
//! * **[`client::Translator`]:** One per operation and protocol. Maps logical arguments to a
//!   [`transport::WireRequest`] and maps the wire response back into a normalized payload.
//! * **[`transport::TransportAdapter`]:** Executes exactly one wire call under a fixed timeout
//!   and records a [`metrics::CallRecord`] into the caller-owned [`metrics::MetricsSink`].
//!
//! ## Wire transports
//!
//! * **[`transport::HttpTransport`]:** JSON over HTTP. Used for REST and for RPC through the
//!   services' JSON transcoding gateway.
//! * **[`transport::GrpcTransport`]:** Native gRPC. Requests are resolved against the
//!   transcoding rules and sent through the dynamic [`grpc::codec::JsonCodec`], so the same
//!   translators drive both wire modes.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost-reflect` and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod client;
pub mod config;
pub mod error;
pub mod grpc;
pub mod metrics;
pub mod transcoding;
pub mod transport;

// Re-exports
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
