//! # JSON transcoding gateway
//!
//! Exposes the RPC methods of a service as plain JSON endpoints, one route per
//! [`qrlink_proto::HttpRule`]. Each request is turned into a unary call on the in-process
//! gRPC routes through the dynamic JSON codec, so the gateway never needs the generated
//! message types.
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, get, on};
use axum::{Json, Router};
use qrlink_core::grpc::client::GrpcClient;
use qrlink_core::prost_reflect::MethodDescriptor;
use qrlink_core::transcoding::{TranscodingTable, http_status, merge_path_params, status_body};
use qrlink_proto::{HttpRule, HttpVerb};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use tonic::Status;
use tonic::service::Routes;

#[derive(Clone)]
struct Gateway {
    client: GrpcClient<Routes>,
    method: MethodDescriptor,
}

/// Routes of every rule bound to a method of `service`.
pub fn router(routes: Routes, table: &TranscodingTable, service: &str) -> Router {
    table.for_service(service).fold(Router::new(), |router, binding| {
        let gateway = Gateway {
            client: GrpcClient::new(routes.clone()),
            method: binding.method.clone(),
        };
        let filter = method_filter(binding.rule.verb);

        let method_router = if binding.rule.path_fields().next().is_some() {
            on(filter, with_path_params).with_state(gateway)
        } else {
            on(filter, without_path_params).with_state(gateway)
        };
        router.route(binding.rule.path, method_router)
    })
}

/// `GET /` describing the transcoded endpoints of `service`.
pub fn info(name: &'static str, service: &'static str) -> Router {
    let endpoints: Map<String, Value> = HttpRule::for_service(service)
        .map(|rule| {
            (
                rule.method.to_string(),
                json!(format!("{} {}", rule.verb.as_str(), rule.path)),
            )
        })
        .collect();
    let body = json!({
        "service": name,
        "rpcService": service,
        "protocol": "gRPC with JSON transcoding",
        "endpoints": endpoints,
        "reflection": "grpc.reflection.v1.ServerReflection",
    });

    Router::new().route("/", get(move || async move { Json(body) }))
}

fn method_filter(verb: HttpVerb) -> MethodFilter {
    match verb {
        HttpVerb::Get => MethodFilter::GET,
        HttpVerb::Post => MethodFilter::POST,
    }
}

async fn with_path_params(
    State(gateway): State<Gateway>,
    Path(params): Path<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let params = params
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    forward(gateway, params, body).await
}

async fn without_path_params(State(gateway): State<Gateway>, body: Bytes) -> Response {
    forward(gateway, Map::new(), body).await
}

async fn forward(gateway: Gateway, params: Map<String, Value>, body: Bytes) -> Response {
    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                return status_response(&Status::invalid_argument(format!(
                    "Request body is not valid JSON: {e}"
                )));
            }
        }
    };

    let Gateway { mut client, method } = gateway;
    let message = merge_path_params(body, params);

    match client.unary(method, message).await {
        Ok(Ok(decoded)) => Json(decoded.value).into_response(),
        Ok(Err(status)) => status_response(&status),
        Err(e) => {
            tracing::error!(error = %e, "transcoded call could not be sent");
            status_response(&Status::internal(e.to_string()))
        }
    }
}

/// Requests no route matched. gRPC callers get `UNIMPLEMENTED` in gRPC framing, anything
/// else a JSON 404.
pub async fn fallback(method: Method, uri: Uri, headers: HeaderMap) -> Response {
    let grpc = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/grpc"));
    if grpc {
        return Status::unimplemented(format!("no service at {}", uri.path())).into_http();
    }
    status_response(&Status::not_found(format!("Cannot {method} {uri}")))
}

fn status_response(status: &Status) -> Response {
    let code = StatusCode::from_u16(http_status(status.code()))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(status_body(status))).into_response()
}
