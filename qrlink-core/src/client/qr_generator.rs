use super::Operation;
use super::translate::{Binding, Normalized, RestTranslator, Translator, invoke, now_rfc3339};
use super::types::{DecodeQr, GenerateQr, OperationResult, PageRequest, QrBatch, QrId, Validate};
use crate::config::{Protocol, ServiceName};
use crate::error::CallError;
use crate::transport::{TransportAdapter, WireRequest};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Client of the QR generator service.
pub struct QrGenerator {
    adapter: Arc<TransportAdapter>,
    generate: Binding<GenerateQr>,
    decode: Binding<DecodeQr>,
    batch: Binding<QrBatch>,
    get: Binding<QrId>,
    list: Binding<PageRequest>,
    delete: Binding<QrId>,
}

impl QrGenerator {
    pub fn new(adapter: Arc<TransportAdapter>) -> Self {
        match adapter.protocol() {
            Protocol::Rest => Self {
                adapter,
                generate: Binding::supported(RestTranslator::new(|args: &GenerateQr| {
                    WireRequest::post("/api/v1/qr/generate", json!(args))
                })),
                decode: Binding::supported(RestTranslator::new(|args: &DecodeQr| {
                    WireRequest::post("/api/v1/qr/decode", json!({ "qrCode": args.qr_code }))
                })),
                batch: Binding::supported(RestTranslator::new(|args: &QrBatch| {
                    WireRequest::post("/api/v1/qr/batch", json!(args))
                })),
                get: Binding::supported(RestTranslator::new(|args: &QrId| {
                    WireRequest::get(format!("/api/v1/qr/{}", args.0))
                })),
                list: Binding::supported(RestTranslator::new(|args: &PageRequest| {
                    WireRequest::get("/api/v1/qr")
                        .with_query("page", args.page)
                        .with_query("size", args.size)
                })),
                delete: Binding::supported(RestTranslator::new(|args: &QrId| {
                    WireRequest::delete(format!("/api/v1/qr/{}", args.0))
                })),
            },
            Protocol::Rpc => Self {
                adapter,
                generate: Binding::supported(RpcGenerateQr),
                decode: Binding::supported(RpcDecodeQr),
                batch: Binding::Unsupported,
                get: Binding::Unsupported,
                list: Binding::Unsupported,
                delete: Binding::Unsupported,
            },
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.adapter.protocol()
    }

    pub async fn generate_qr(&self, args: &GenerateQr) -> Result<OperationResult, CallError> {
        self.call(Operation::GenerateQr, &self.generate, args).await
    }

    pub async fn decode_qr(&self, args: &DecodeQr) -> Result<OperationResult, CallError> {
        self.call(Operation::DecodeQr, &self.decode, args).await
    }

    pub async fn generate_qr_batch(&self, args: &QrBatch) -> Result<OperationResult, CallError> {
        self.call(Operation::GenerateQrBatch, &self.batch, args)
            .await
    }

    pub async fn get_qr(&self, args: &QrId) -> Result<OperationResult, CallError> {
        self.call(Operation::GetQr, &self.get, args).await
    }

    pub async fn list_qrs(&self, args: &PageRequest) -> Result<OperationResult, CallError> {
        self.call(Operation::ListQrs, &self.list, args).await
    }

    pub async fn delete_qr(&self, args: &QrId) -> Result<OperationResult, CallError> {
        self.call(Operation::DeleteQr, &self.delete, args).await
    }

    async fn call<A>(
        &self,
        operation: Operation,
        binding: &Binding<A>,
        args: &A,
    ) -> Result<OperationResult, CallError>
    where
        A: Validate + Sync,
    {
        invoke(
            &self.adapter,
            ServiceName::QrGenerator,
            operation,
            binding,
            args,
        )
        .await
    }
}

/// `CreateQr` through `POST /v1/qrcode/encode`. The RPC only takes the data; presentation
/// options are echoed back so both protocols return the same shape.
struct RpcGenerateQr;

impl Translator for RpcGenerateQr {
    type Args = GenerateQr;

    fn build_request(&self, args: &GenerateQr) -> WireRequest {
        WireRequest::post("/v1/qrcode/encode", json!({ "url": args.data }))
    }

    fn parse_response(&self, args: &GenerateQr, body: Value) -> Normalized {
        let qr_code = body
            .get("qrCodeBase64")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut payload = Map::new();
        payload.insert(
            "id".into(),
            json!(format!("grpc-{}", chrono::Utc::now().timestamp_millis())),
        );
        payload.insert("data".into(), json!(args.data));
        payload.insert("format".into(), json!(args.format));
        payload.insert("qrCode".into(), json!(qr_code));
        payload.insert("size".into(), json!(args.size));
        payload.insert("errorCorrection".into(), json!(args.error_correction));
        payload.insert("createdAt".into(), json!(now_rfc3339()));
        Normalized::new(payload)
    }
}

/// `DecodeQr` through `POST /v1/qrcode/decode`.
struct RpcDecodeQr;

impl Translator for RpcDecodeQr {
    type Args = DecodeQr;

    fn build_request(&self, args: &DecodeQr) -> WireRequest {
        WireRequest::post("/v1/qrcode/decode", json!({ "qrCodeBase64": args.qr_code }))
    }

    fn parse_response(&self, _args: &DecodeQr, body: Value) -> Normalized {
        let data = body.get("url").and_then(Value::as_str).unwrap_or_default();

        let mut payload = Map::new();
        payload.insert("data".into(), json!(data));
        Normalized::new(payload)
    }
}
