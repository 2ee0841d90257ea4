//! Translators map logical arguments to wire requests and wire responses back to a
//! normalized payload. Each operation gets one per protocol, picked once when the client is
//! built; an operation a protocol cannot serve is bound to [`Binding::Unsupported`].
use super::Operation;
use super::types::{OperationResult, Payload, Validate};
use crate::config::ServiceName;
use crate::error::CallError;
use crate::transport::{TransportAdapter, WireRequest};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Normalized response content, before metrics are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub payload: Payload,
    pub message: Option<String>,
}

impl Normalized {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            message: None,
        }
    }
}

pub trait Translator: Send + Sync {
    type Args;

    /// Pure and deterministic: the same arguments always produce the same request.
    fn build_request(&self, args: &Self::Args) -> WireRequest;

    fn parse_response(&self, args: &Self::Args, body: Value) -> Normalized;
}

pub enum Binding<A> {
    Supported(Arc<dyn Translator<Args = A>>),
    Unsupported,
}

impl<A> Binding<A> {
    pub fn supported(translator: impl Translator<Args = A> + 'static) -> Self {
        Binding::Supported(Arc::new(translator))
    }
}

/// REST translator: a request builder plus envelope unwrapping.
pub struct RestTranslator<A> {
    build: fn(&A) -> WireRequest,
}

impl<A> RestTranslator<A> {
    pub fn new(build: fn(&A) -> WireRequest) -> Self {
        Self { build }
    }
}

impl<A> Translator for RestTranslator<A> {
    type Args = A;

    fn build_request(&self, args: &A) -> WireRequest {
        (self.build)(args)
    }

    fn parse_response(&self, _args: &A, body: Value) -> Normalized {
        unwrap_envelope(body)
    }
}

/// Extracts `data` from a `{success, data, message}` envelope.
///
/// Bodies without an object `data` are taken as the payload themselves; anything that is
/// not an object ends up under `value`.
pub fn unwrap_envelope(body: Value) -> Normalized {
    match body {
        Value::Object(mut envelope) => {
            let message = match envelope.get("message") {
                Some(Value::String(message)) => Some(message.clone()),
                _ => None,
            };
            let payload = match envelope.remove("data") {
                Some(Value::Object(data)) => data,
                Some(Value::Null) | None => envelope,
                Some(other) => wrap_value(other),
            };
            Normalized { payload, message }
        }
        other => Normalized::new(wrap_value(other)),
    }
}

fn wrap_value(value: Value) -> Payload {
    let mut payload = Map::new();
    payload.insert("value".to_string(), value);
    payload
}

/// Capability check, validation, one wire call, normalization. In that order.
pub(crate) async fn invoke<A>(
    adapter: &TransportAdapter,
    service: ServiceName,
    operation: Operation,
    binding: &Binding<A>,
    args: &A,
) -> Result<OperationResult, CallError>
where
    A: Validate + Sync,
{
    let Binding::Supported(translator) = binding else {
        return Err(CallError::CapabilityUnsupported {
            operation,
            protocol: adapter.protocol(),
        });
    };
    args.validate()?;

    let request = translator.build_request(args);
    let raw = adapter.execute(service, request).await?;
    let Normalized { payload, message } = translator.parse_response(args, raw.body);

    Ok(OperationResult {
        payload,
        metrics: raw.metrics,
        status_code: raw.status_code,
        message,
    })
}

/// Current time as sent in normalized RPC payloads.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
