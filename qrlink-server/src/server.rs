//! # Application assembly
//!
//! Builds the router of every service and serves it. RPC apps serve native gRPC, gRPC
//! server reflection, the JSON transcoding gateway and `GET /health` on a single port.
use crate::analytics::{self, AnalyticsState};
use crate::error::ServerError;
use crate::links::LinkService;
use crate::links::rpc::LinkRpc;
use crate::qr::QrService;
use crate::qr::rpc::QrRpc;
use crate::{gateway, health, links, qr, user_management};
use axum::Router;
use qrlink_core::config::ClientConfig;
use qrlink_core::transcoding::TranscodingTable;
use qrlink_proto::{
    FILE_DESCRIPTOR_SET, LINK_SHORTENER_SERVICE, LinkShortenerServer, QR_CODE_SERVICE,
    QrCodeGeneratorServer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tonic::service::Routes;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn link_shortener_rest(service: Arc<LinkService>) -> Router {
    let app = links::rest::router(service).merge(health::router("link-shortener", "REST"));
    layered(app)
}

pub fn link_shortener_rpc(service: Arc<LinkService>) -> Result<Router, ServerError> {
    let routes = Routes::new(LinkShortenerServer::new(LinkRpc::new(service)));
    rpc_app(
        "Link Shortener gRPC Service",
        LINK_SHORTENER_SERVICE,
        routes,
    )
}

pub fn qr_generator_rest(service: Arc<QrService>) -> Router {
    let app = qr::rest::router(service).merge(health::router("qr-generator", "REST"));
    layered(app)
}

pub fn qr_generator_rpc(service: Arc<QrService>) -> Result<Router, ServerError> {
    let routes = Routes::new(QrCodeGeneratorServer::new(QrRpc::new(service)));
    rpc_app("QR Code gRPC Service", QR_CODE_SERVICE, routes)
}

pub fn user_management() -> Router {
    let app = user_management::router().merge(health::router("user-management", "REST"));
    layered(app)
}

pub fn analytics(config: ClientConfig) -> Router {
    let state = AnalyticsState::new(config);
    let app = analytics::router(state).merge(health::router("analytics", "REST"));
    layered(app)
}

fn rpc_app(
    name: &'static str,
    service: &'static str,
    routes: Routes,
) -> Result<Router, ServerError> {
    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;
    let routes = routes.add_service(reflection);
    let table = TranscodingTable::load()?;

    let app = gateway::router(routes.clone(), &table, service)
        .merge(gateway::info(name, service))
        .merge(health::router(name, "gRPC"))
        .merge(routes.into_axum_router())
        .fallback(gateway::fallback);

    Ok(layered(app))
}

fn layered(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `addr` and serves `app` until Ctrl-C.
pub async fn serve(name: &str, addr: SocketAddr, app: Router) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(service = name, %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(ServerError::Serve)
}
