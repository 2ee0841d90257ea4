use super::Operation;
use super::translate::{Binding, Normalized, RestTranslator, Translator, invoke, now_rfc3339};
use super::types::{BulkShorten, OperationResult, PageRequest, ShortCode, ShortenUrl};
use crate::config::{Protocol, ServiceName};
use crate::error::CallError;
use crate::transport::{TransportAdapter, WireRequest};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Client of the URL shortener service.
pub struct UrlShortener {
    adapter: Arc<TransportAdapter>,
    shorten: Binding<ShortenUrl>,
    resolve: Binding<ShortCode>,
    stats: Binding<ShortCode>,
    bulk: Binding<BulkShorten>,
    list: Binding<PageRequest>,
    delete: Binding<ShortCode>,
}

impl UrlShortener {
    /// `rpc_base_address` is the public address short URLs are built on under RPC.
    pub fn new(adapter: Arc<TransportAdapter>, rpc_base_address: &str) -> Self {
        match adapter.protocol() {
            Protocol::Rest => Self {
                adapter,
                shorten: Binding::supported(RestTranslator::new(|args: &ShortenUrl| {
                    WireRequest::post("/api/v1/url/shorten", json!(args))
                })),
                resolve: Binding::supported(RestTranslator::new(|args: &ShortCode| {
                    WireRequest::get(format!("/api/v1/url/{}", args.0))
                        .with_query("redirect", false)
                })),
                stats: Binding::supported(RestTranslator::new(|args: &ShortCode| {
                    WireRequest::get(format!("/api/v1/url/{}/stats", args.0))
                })),
                bulk: Binding::supported(RestTranslator::new(|args: &BulkShorten| {
                    WireRequest::post("/api/v1/url/bulk", json!(args))
                })),
                list: Binding::supported(RestTranslator::new(|args: &PageRequest| {
                    let request = WireRequest::get("/api/v1/url")
                        .with_query("page", args.page)
                        .with_query("size", args.size);
                    match &args.user_id {
                        Some(user_id) => request.with_query("userId", user_id),
                        None => request,
                    }
                })),
                delete: Binding::supported(RestTranslator::new(|args: &ShortCode| {
                    WireRequest::delete(format!("/api/v1/url/{}", args.0))
                })),
            },
            Protocol::Rpc => Self {
                adapter,
                shorten: Binding::supported(RpcShortenUrl {
                    base_address: rpc_base_address.trim_end_matches('/').to_string(),
                }),
                resolve: Binding::supported(RpcResolveUrl),
                stats: Binding::Unsupported,
                bulk: Binding::Unsupported,
                list: Binding::Unsupported,
                delete: Binding::Unsupported,
            },
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.adapter.protocol()
    }

    pub async fn shorten_url(&self, args: &ShortenUrl) -> Result<OperationResult, CallError> {
        self.call(Operation::ShortenUrl, &self.shorten, args).await
    }

    pub async fn resolve_url(&self, args: &ShortCode) -> Result<OperationResult, CallError> {
        self.call(Operation::ResolveUrl, &self.resolve, args).await
    }

    pub async fn get_url_stats(&self, args: &ShortCode) -> Result<OperationResult, CallError> {
        self.call(Operation::GetUrlStats, &self.stats, args).await
    }

    pub async fn bulk_shorten_urls(
        &self,
        args: &BulkShorten,
    ) -> Result<OperationResult, CallError> {
        self.call(Operation::BulkShortenUrls, &self.bulk, args)
            .await
    }

    pub async fn list_urls(&self, args: &PageRequest) -> Result<OperationResult, CallError> {
        self.call(Operation::ListUrls, &self.list, args).await
    }

    pub async fn delete_url(&self, args: &ShortCode) -> Result<OperationResult, CallError> {
        self.call(Operation::DeleteUrl, &self.delete, args).await
    }

    async fn call<A>(
        &self,
        operation: Operation,
        binding: &Binding<A>,
        args: &A,
    ) -> Result<OperationResult, CallError>
    where
        A: super::types::Validate + Sync,
    {
        invoke(
            &self.adapter,
            ServiceName::UrlShortener,
            operation,
            binding,
            args,
        )
        .await
    }
}

/// `CreateLink` through `POST /v1/links`. The reply only carries the generated code.
struct RpcShortenUrl {
    base_address: String,
}

impl Translator for RpcShortenUrl {
    type Args = ShortenUrl;

    fn build_request(&self, args: &ShortenUrl) -> WireRequest {
        WireRequest::post("/v1/links", json!({ "url": args.url }))
    }

    fn parse_response(&self, args: &ShortenUrl, body: Value) -> Normalized {
        let reply = body
            .get("shortUrl")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let code = reply.rsplit('/').next().unwrap_or_default();

        let mut payload = Map::new();
        payload.insert("originalUrl".into(), json!(args.url));
        let short_url = format!("{}/{code}", self.base_address);
        payload.insert("shortUrl".into(), json!(short_url));
        payload.insert("shortCode".into(), json!(code));
        payload.insert("createdAt".into(), json!(now_rfc3339()));
        Normalized::new(payload)
    }
}

/// `GetUrl` through `GET /{short_url}`.
struct RpcResolveUrl;

impl Translator for RpcResolveUrl {
    type Args = ShortCode;

    fn build_request(&self, args: &ShortCode) -> WireRequest {
        WireRequest::get(format!("/{}", args.0))
    }

    fn parse_response(&self, args: &ShortCode, body: Value) -> Normalized {
        let url = body.get("url").and_then(Value::as_str).unwrap_or_default();

        let mut payload = Map::new();
        payload.insert("originalUrl".into(), json!(url));
        payload.insert("shortCode".into(), json!(args.0));
        Normalized::new(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_shorten_rebuilds_short_url_on_base_address() {
        let translator = RpcShortenUrl {
            base_address: "http://localhost:5001".to_string(),
        };
        let args = ShortenUrl::new("https://example.com/very/long");

        let request = translator.build_request(&args);
        assert_eq!(request.path, "/v1/links");
        let expected = json!({"url": "https://example.com/very/long"});
        assert_eq!(request.body, Some(expected));

        let normalized = translator.parse_response(&args, json!({"shortUrl": "aB3_x9"}));
        let payload = &normalized.payload;
        assert_eq!(payload["shortCode"], "aB3_x9");
        assert_eq!(payload["shortUrl"], "http://localhost:5001/aB3_x9");
        assert_eq!(payload["originalUrl"], "https://example.com/very/long");
        assert!(payload["createdAt"].is_string());

        // A reply that already is a full URL keeps only its last segment as code.
        let normalized =
            translator.parse_response(&args, json!({"shortUrl": "http://elsewhere/zz9Q"}));
        assert_eq!(normalized.payload["shortCode"], "zz9Q");
    }

    #[test]
    fn rpc_resolve_defaults_missing_url_to_empty() {
        let args = ShortCode("nope00".to_string());
        assert_eq!(RpcResolveUrl.build_request(&args).path, "/nope00");

        let normalized = RpcResolveUrl.parse_response(&args, json!({}));
        assert_eq!(normalized.payload["originalUrl"], "");
        assert_eq!(normalized.payload["shortCode"], "nope00");
    }
}
