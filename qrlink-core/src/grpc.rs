//! # Dynamic gRPC
//!
//! Low-level building blocks for unary gRPC calls whose messages are `serde_json::Value`
//! instead of generated structs. The same client powers the native RPC transport on the
//! client side and the JSON transcoding gateway on the server side.
pub mod client;
pub mod codec;
