use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::time::Instant;

/// `GET /health` reporting `{status, service, protocol, timestamp, uptimeSeconds}`.
pub fn router(service: &'static str, protocol: &'static str) -> Router {
    let started = Instant::now();

    Router::new().route(
        "/health",
        get(move || async move {
            Json(json!({
                "status": "healthy",
                "service": service,
                "protocol": protocol,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                "uptimeSeconds": started.elapsed().as_secs(),
            }))
        }),
    )
}
