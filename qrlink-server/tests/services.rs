use axum::Router;
use qrlink_core::client::{
    ClientFactory, ClientSet, DecodeQr, GenerateQr, PageRequest, ShortCode, ShortenUrl,
};
use qrlink_core::config::{ClientConfig, EndpointRegistry, Protocol, RpcWire, ServiceName};
use qrlink_core::error::CallError;
use qrlink_core::metrics::MetricsLog;
use qrlink_core::transport::GrpcTransport;
use qrlink_proto::{LinkShortenerServer, QrCodeGeneratorServer};
use qrlink_server::analytics::{self, AnalyticsState};
use qrlink_server::links::LinkService;
use qrlink_server::links::rpc::LinkRpc;
use qrlink_server::qr::QrService;
use qrlink_server::qr::rpc::QrRpc;
use qrlink_server::server;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tonic::service::Routes;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    (listener, address)
}

fn spawn(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

async fn serve(app: Router) -> String {
    let (listener, address) = bind().await;
    spawn(listener, app);
    address
}

struct Backend {
    links: Arc<LinkService>,
    qr: Arc<QrService>,
    registry: EndpointRegistry,
}

/// REST and RPC apps of the link shortener and the QR generator, sharing their stores.
async fn backend() -> Backend {
    let (rest_listener, rest_address) = bind().await;
    let links = Arc::new(LinkService::new(rest_address.clone()));
    let qr = Arc::new(QrService::new());

    spawn(rest_listener, server::link_shortener_rest(links.clone()));
    let link_rpc = serve(server::link_shortener_rpc(links.clone()).unwrap()).await;
    let qr_rest = serve(server::qr_generator_rest(qr.clone())).await;
    let qr_rpc = serve(server::qr_generator_rpc(qr.clone()).unwrap()).await;

    let registry = EndpointRegistry::empty()
        .with(Protocol::Rest, ServiceName::UrlShortener, &rest_address)
        .with(Protocol::Rest, ServiceName::QrGenerator, &qr_rest)
        .with(Protocol::Rpc, ServiceName::UrlShortener, &link_rpc)
        .with(Protocol::Rpc, ServiceName::QrGenerator, &qr_rpc);

    Backend {
        links,
        qr,
        registry,
    }
}

fn clients(protocol: Protocol, config: &ClientConfig, log: &Arc<MetricsLog>) -> ClientSet {
    ClientFactory::create(protocol, config, log.clone()).unwrap()
}

#[tokio::test]
async fn test_rest_clients_drive_every_operation() {
    let backend = backend().await;
    let config = ClientConfig::default().with_endpoints(backend.registry.clone());
    let log = Arc::new(MetricsLog::new());
    let clients = clients(Protocol::Rest, &config, &log);
    let urls = &clients.url_shortener;
    let original = "https://example.com/a/long/path";

    let created = urls.shorten_url(&ShortenUrl::new(original)).await.unwrap();
    assert_eq!(created.status_code, 201);
    assert_eq!(created.payload["originalUrl"], original);
    let code = created.payload["shortCode"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    let short_url = created.payload["shortUrl"].as_str().unwrap();
    assert!(short_url.ends_with(&format!("/api/v1/url/{code}")));

    let resolved = urls.resolve_url(&ShortCode(code.clone())).await.unwrap();
    assert_eq!(resolved.payload["originalUrl"], original);

    let stats = urls.get_url_stats(&ShortCode(code.clone())).await.unwrap();
    assert_eq!(stats.payload["clicks"], 1);

    let listed = urls.list_urls(&PageRequest::default()).await.unwrap();
    assert_eq!(listed.payload["totalItems"], 1);

    urls.delete_url(&ShortCode(code.clone())).await.unwrap();
    let err = urls.resolve_url(&ShortCode(code)).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert!(!err.is_permanent());

    let qr = clients
        .qr_generator
        .generate_qr(&GenerateQr::new("hello"))
        .await
        .unwrap();
    let qr_code = qr.payload["qrCode"].as_str().unwrap().to_string();
    assert!(!qr_code.is_empty());
    assert_eq!(qr.payload["format"], "PNG");

    let decoded = clients
        .qr_generator
        .decode_qr(&DecodeQr { qr_code })
        .await
        .unwrap();
    assert_eq!(decoded.payload["data"], "hello");

    // shorten, resolve, stats, list, delete, failed resolve, generate, decode
    assert_eq!(log.len(), 8);
    assert!(log.records().iter().all(|r| r.protocol == Protocol::Rest));
}

#[tokio::test]
async fn test_transcoded_rpc_clients_share_the_rest_store() {
    let backend = backend().await;
    let config = ClientConfig::default().with_endpoints(backend.registry.clone());
    let log = Arc::new(MetricsLog::new());
    let clients = clients(Protocol::Rpc, &config, &log);

    let created = clients
        .url_shortener
        .shorten_url(&ShortenUrl::new("https://example.com/rpc"))
        .await
        .unwrap();
    let code = created.payload["shortCode"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    let rpc_base = backend
        .registry
        .base_address(Protocol::Rpc, ServiceName::UrlShortener)
        .unwrap();
    assert_eq!(created.payload["shortUrl"], format!("{rpc_base}/{code}"));

    assert_eq!(backend.links.original_url(&code), "https://example.com/rpc");

    let resolved = clients
        .url_shortener
        .resolve_url(&ShortCode(code))
        .await
        .unwrap();
    assert_eq!(resolved.payload["originalUrl"], "https://example.com/rpc");

    let qr = clients
        .qr_generator
        .generate_qr(&GenerateQr::new("hello"))
        .await
        .unwrap();
    assert!(!qr.payload["qrCode"].as_str().unwrap().is_empty());
    assert_eq!(qr.payload["size"], 256);
    assert_eq!(qr.payload["errorCorrection"], "MEDIUM");

    let before = log.len();
    let err = clients
        .url_shortener
        .get_url_stats(&ShortCode("abc123".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::CapabilityUnsupported { .. }));
    assert_eq!(log.len(), before);
}

#[tokio::test]
async fn test_native_rpc_over_the_shared_port() {
    let backend = backend().await;
    let config = ClientConfig::default()
        .with_endpoints(backend.registry.clone())
        .with_rpc_wire(RpcWire::Native);
    let log = Arc::new(MetricsLog::new());
    let clients = clients(Protocol::Rpc, &config, &log);

    let created = clients
        .url_shortener
        .shorten_url(&ShortenUrl::new("https://example.com/native"))
        .await
        .unwrap();
    let code = created.payload["shortCode"].as_str().unwrap().to_string();

    let resolved = clients
        .url_shortener
        .resolve_url(&ShortCode(code))
        .await
        .unwrap();
    assert_eq!(
        resolved.payload["originalUrl"],
        "https://example.com/native"
    );

    let qr = clients
        .qr_generator
        .generate_qr(&GenerateQr::new("native"))
        .await
        .unwrap();
    let qr_code = qr.payload["qrCode"].as_str().unwrap().to_string();
    assert_eq!(backend.qr.decode(&qr_code), "native");
}

#[tokio::test]
async fn test_native_rpc_in_process() {
    let links = Arc::new(LinkService::new("http://localhost:8083"));
    let qr = Arc::new(QrService::new());
    let routes = Routes::new(LinkShortenerServer::new(LinkRpc::new(links.clone())))
        .add_service(QrCodeGeneratorServer::new(QrRpc::new(qr)));

    let transport = GrpcTransport::from_service(routes).unwrap();
    let log = Arc::new(MetricsLog::new());
    let clients = ClientFactory::with_transport(
        Protocol::Rpc,
        &EndpointRegistry::default(),
        Arc::new(transport),
        Duration::from_secs(5),
        log.clone(),
    );

    let created = clients
        .url_shortener
        .shorten_url(&ShortenUrl::new("https://example.com/in-process"))
        .await
        .unwrap();
    let code = created.payload["shortCode"].as_str().unwrap();
    let short_url = format!("http://localhost:5001/{code}");
    assert_eq!(created.payload["shortUrl"], short_url);
    assert_eq!(links.original_url(code), "https://example.com/in-process");

    let missing = clients
        .url_shortener
        .resolve_url(&ShortCode("zzzzzz".to_string()))
        .await
        .unwrap();
    assert_eq!(missing.payload["originalUrl"], "");

    let qr = clients
        .qr_generator
        .generate_qr(&GenerateQr::new("round"))
        .await
        .unwrap();
    let decoded = clients
        .qr_generator
        .decode_qr(&DecodeQr {
            qr_code: qr.payload["qrCode"].as_str().unwrap().to_string(),
        })
        .await
        .unwrap();
    assert_eq!(decoded.payload["data"], "round");

    assert_eq!(log.len(), 4);
    assert!(log.records()[0].metrics.payload_size_bytes > 0);
}

#[tokio::test]
async fn test_rpc_apps_answer_unbound_routes_with_not_found() {
    let links = Arc::new(LinkService::new("http://localhost:8083"));
    let address = serve(server::link_shortener_rpc(links).unwrap()).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{address}/no/such/route"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert!(response.headers().get("grpc-status").is_none());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 5);
    assert_eq!(body["message"], "Cannot GET /no/such/route");

    let response = http
        .post(format!("{address}/no.such.Service/Call"))
        .header("content-type", "application/grpc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["grpc-status"], "12");

    let body: Value = http
        .get(format!("{address}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["protocol"], "gRPC");
}

#[tokio::test]
async fn test_user_management_answers_not_implemented() {
    let address = serve(server::user_management()).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{address}/api/v1/auth/login"))
        .json(&json!({ "email": "a@b.c", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 501);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "NotImplemented");
    assert!(body["note"].is_string());

    let response = http.get(format!("{address}/nowhere")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cannot GET /nowhere");
    assert_eq!(body["availableEndpoints"][2], "/health");

    let body: Value = http
        .get(format!("{address}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "user-management");
}

#[tokio::test]
async fn test_analytics_aggregates_service_health() {
    let backend = backend().await;
    let users = serve(server::user_management()).await;
    let (listener, analytics) = bind().await;

    let registry = backend
        .registry
        .clone()
        .with(Protocol::Rest, ServiceName::UserManagement, &users)
        .with(Protocol::Rest, ServiceName::Analytics, &analytics)
        // Nothing listens on port 1.
        .with(
            Protocol::Rpc,
            ServiceName::UserManagement,
            "http://127.0.0.1:1",
        );
    let config = ClientConfig::default()
        .with_endpoints(registry)
        .with_timeout(Duration::from_secs(5));
    spawn(listener, server::analytics(config));

    let http = reqwest::Client::new();
    let body: Value = http
        .get(format!("{analytics}/api/v1/health/services"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["protocol"], "REST");
    assert_eq!(body["data"]["overall"], "healthy");
    let services = &body["data"]["services"];
    assert_eq!(services["userManagement"]["status"], "healthy");
    assert_eq!(services["urlShortener"]["protocol"], "REST");

    let body: Value = http
        .get(format!("{analytics}/api/v1/health/services?protocol=rpc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["overall"], "degraded");
    let services = &body["data"]["services"];
    assert_eq!(services["userManagement"]["status"], "ERROR");
    assert_eq!(services["qrGenerator"]["protocol"], "gRPC");

    let body: Value = http
        .get(format!("{analytics}/api/v1/metrics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["rest"]["records"].as_array().unwrap().len(), 4);
    assert_eq!(body["data"]["rpc"]["records"].as_array().unwrap().len(), 3);

    let response = http
        .get(format!("{analytics}/api/v1/health/services?protocol=soap"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_analytics_log_is_capped() {
    let users = serve(server::user_management()).await;
    let registry =
        EndpointRegistry::empty().with(Protocol::Rest, ServiceName::UserManagement, &users);
    let config = ClientConfig::default().with_endpoints(registry);
    let state = AnalyticsState::with_log_capacity(config, 3);
    let address = serve(analytics::router(state.clone())).await;
    let http = reqwest::Client::new();

    for _ in 0..5 {
        let response = http
            .get(format!("{address}/api/v1/health/services"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
    assert_eq!(state.log().len(), 3);

    let body: Value = http
        .get(format!("{address}/api/v1/metrics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["rest"]["records"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["rest"]["summary"]["totalRequests"], 3);
}
