//! REST surface of the QR generator, under `/api/v1/qr`.
use super::{QrRecord, QrService};
use crate::envelope::{Envelope, Page};
use crate::error::ServiceError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use qrlink_core::client::GenerateQr;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

pub fn router(service: Arc<QrService>) -> Router {
    Router::new()
        .route("/api/v1/qr", get(list))
        .route("/api/v1/qr/generate", post(generate))
        .route("/api/v1/qr/decode", post(decode))
        .route("/api/v1/qr/batch", post(batch))
        .route("/api/v1/qr/{id}", get(fetch).delete(delete))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodeRequest {
    qr_code: String,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    requests: Vec<GenerateQr>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<u32>,
    size: Option<u32>,
}

async fn generate(
    State(service): State<Arc<QrService>>,
    payload: Result<Json<GenerateQr>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(request) = payload?;
    let record = service.generate(&request)?;

    Ok(Envelope::ok(record)
        .with_message("QR code generated successfully")
        .with_status(StatusCode::CREATED))
}

async fn decode(
    State(service): State<Arc<QrService>>,
    payload: Result<Json<DecodeRequest>, JsonRejection>,
) -> Result<Envelope<Value>, ServiceError> {
    let Json(request) = payload?;
    if request.qr_code.trim().is_empty() {
        return Err(ServiceError::Validation("qrCode must not be empty".to_string()));
    }

    let data = service.decode(&request.qr_code);
    if data.is_empty() {
        return Err(ServiceError::NotFound(
            "QR code was not generated by this service".to_string(),
        ));
    }
    Ok(Envelope::ok(json!({ "data": data })))
}

async fn batch(
    State(service): State<Arc<QrService>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(request) = payload?;
    let records = service.batch(&request.requests)?;
    let message = format!("{} QR codes generated successfully", records.len());

    Ok(Envelope::ok(records)
        .with_message(message)
        .with_status(StatusCode::CREATED))
}

async fn fetch(
    State(service): State<Arc<QrService>>,
    Path(id): Path<String>,
) -> Result<Envelope<QrRecord>, ServiceError> {
    Ok(Envelope::ok(service.get(&id)?))
}

async fn list(
    State(service): State<Arc<QrService>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Envelope<Page<QrRecord>>, ServiceError> {
    let Query(query) = query?;
    let page = service.list(query.page.unwrap_or(1), query.size.unwrap_or(10))?;
    Ok(Envelope::ok(page))
}

async fn delete(
    State(service): State<Arc<QrService>>,
    Path(id): Path<String>,
) -> Result<Envelope<Value>, ServiceError> {
    let record = service.delete(&id)?;
    Ok(Envelope::ok(json!({ "id": record.id })).with_message("QR code deleted successfully"))
}
