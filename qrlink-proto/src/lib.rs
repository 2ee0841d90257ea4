//! # qrlink protocol definitions
//!
//! Generated `tonic`/`prost` bindings for the two RPC services, the encoded
//! descriptor set used by the dynamic JSON codec and by server reflection, and the
//! JSON transcoding rules that bind every RPC method to one fixed HTTP verb and path.
//!
//! The transcoding rules live next to the service definitions so that the server
//! gateway and the clients agree on them.

pub mod http_rules;

pub mod link_shortener {
    include!(concat!(env!("OUT_DIR"), "/linkshortener.v1.rs"));
}

pub mod qr_code {
    include!(concat!(env!("OUT_DIR"), "/qrcode.v1.rs"));
}

pub use http_rules::{HTTP_RULES, HttpRule, HttpVerb};
pub use link_shortener::link_shortener_server::{LinkShortener, LinkShortenerServer};
pub use qr_code::qr_code_generator_server::{QrCodeGenerator, QrCodeGeneratorServer};

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");

/// Fully qualified name of the link shortener service.
pub const LINK_SHORTENER_SERVICE: &str = "linkshortener.v1.LinkShortener";

/// Fully qualified name of the QR code service.
pub const QR_CODE_SERVICE: &str = "qrcode.v1.QrCodeGenerator";
