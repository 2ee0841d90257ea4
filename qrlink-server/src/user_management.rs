//! # User management placeholder
//!
//! Declares the user management API without implementing it: every business endpoint
//! answers `501 Not Implemented`, which clients treat as a permanent failure.
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Map, Value, json};

const NOTE: &str = "This endpoint will be implemented in the production phase";

/// `(name, verb, path, summary)` of every declared endpoint.
const ENDPOINTS: &[(&str, &str, &str, &str)] = &[
    ("register", "POST", "/api/v1/auth/register", "User registration"),
    ("login", "POST", "/api/v1/auth/login", "User login"),
    ("logout", "POST", "/api/v1/auth/logout", "User logout"),
    ("profile", "GET", "/api/v1/users/profile", "User profile"),
    ("updateProfile", "PUT", "/api/v1/users/profile", "Profile update"),
    ("changePassword", "PUT", "/api/v1/users/password", "Password change"),
    ("users", "GET", "/api/v1/users", "User listing"),
    ("health", "GET", "/health", "Health check"),
];

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/api/v1/auth/register",
            post(|| not_implemented("User registration")),
        )
        .route("/api/v1/auth/login", post(|| not_implemented("User login")))
        .route(
            "/api/v1/auth/logout",
            post(|| not_implemented("User logout")),
        )
        .route(
            "/api/v1/users/profile",
            get(|| not_implemented("User profile")).put(|| not_implemented("Profile update")),
        )
        .route(
            "/api/v1/users/password",
            put(|| not_implemented("Password change")),
        )
        .route("/api/v1/users", get(|| not_implemented("User listing")))
        .fallback(not_found)
}

async fn index() -> Json<Value> {
    let endpoints: Map<String, Value> = ENDPOINTS
        .iter()
        .map(|(name, verb, path, _)| (name.to_string(), json!(format!("{verb} {path}"))))
        .collect();

    Json(json!({
        "service": "User Management REST API",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "REST/JSON",
        "endpoints": endpoints,
        "note": "This is a placeholder implementation.",
    }))
}

async fn not_implemented(summary: &'static str) -> Response {
    let body = json!({
        "success": false,
        "error": "NotImplemented",
        "message": format!("{summary} endpoint - Implementation pending"),
        "note": NOTE,
    });
    (StatusCode::NOT_IMPLEMENTED, Json(body)).into_response()
}

async fn not_found(method: Method, uri: Uri) -> Response {
    let body = json!({
        "success": false,
        "error": "NotFound",
        "message": format!("Cannot {method} {uri}"),
        "availableEndpoints": ["/api/v1/auth", "/api/v1/users", "/health"],
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
