//! # qrlink services
//!
//! The four backend services the qrlink clients talk to:
//!
//! * **Link shortener:** REST API under `/api/v1/url` and the `linkshortener.v1.LinkShortener`
//!   RPC service.
//! * **QR generator:** REST API under `/api/v1/qr` and the `qrcode.v1.QrCodeGenerator` RPC
//!   service.
//! * **User management:** a placeholder whose business endpoints answer `501`.
//! * **Analytics:** aggregated health of the other services, through the client facade.
//!
//! The REST and RPC surfaces of one service share a single in-memory [`store::RecordStore`].
//! RPC apps also expose every method as JSON through the [`gateway`].
pub mod analytics;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod health;
pub mod links;
pub mod qr;
pub mod server;
pub mod store;
pub mod user_management;
