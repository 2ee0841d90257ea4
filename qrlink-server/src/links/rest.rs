//! REST surface of the link shortener, under `/api/v1/url`.
use super::{LinkService, LinkView};
use crate::envelope::{Envelope, Page};
use crate::error::ServiceError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub fn router(service: Arc<LinkService>) -> Router {
    Router::new()
        .route("/api/v1/url", get(list))
        .route("/api/v1/url/shorten", post(shorten))
        .route("/api/v1/url/bulk", post(bulk))
        .route("/api/v1/url/{code}", get(resolve).delete(delete))
        .route("/api/v1/url/{code}/stats", get(stats))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShortenRequest {
    url: String,
    custom_code: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRequest {
    urls: Vec<String>,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResolveQuery {
    redirect: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<u32>,
    size: Option<u32>,
    user_id: Option<String>,
}

async fn shorten(
    State(service): State<Arc<LinkService>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(request) = payload?;
    let record = service.shorten(
        &request.url,
        request.custom_code.as_deref(),
        request.user_id.as_deref(),
    )?;

    Ok(Envelope::ok(service.view(record))
        .with_message("URL shortened successfully")
        .with_status(StatusCode::CREATED))
}

/// Answers `302 Found` to the original URL, or the record itself with `?redirect=false`.
async fn resolve(
    State(service): State<Arc<LinkService>>,
    Path(code): Path<String>,
    query: Result<Query<ResolveQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query?;
    let record = service.resolve(&code)?;

    if query.redirect.unwrap_or(true) {
        let location = [(header::LOCATION, record.original_url)];
        return Ok((StatusCode::FOUND, location).into_response());
    }
    Ok(Envelope::ok(service.view(record)).into_response())
}

async fn stats(
    State(service): State<Arc<LinkService>>,
    Path(code): Path<String>,
) -> Result<Envelope<LinkView>, ServiceError> {
    let record = service.stats(&code)?;
    Ok(Envelope::ok(service.view(record)))
}

async fn bulk(
    State(service): State<Arc<LinkService>>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(request) = payload?;
    let records = service.bulk(&request.urls, request.user_id.as_deref())?;
    let message = format!("{} URLs shortened successfully", records.len());
    let views: Vec<LinkView> = records.into_iter().map(|r| service.view(r)).collect();

    Ok(Envelope::ok(views)
        .with_message(message)
        .with_status(StatusCode::CREATED))
}

async fn list(
    State(service): State<Arc<LinkService>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Envelope<Page<LinkView>>, ServiceError> {
    let Query(query) = query?;
    let page = service.list(
        query.page.unwrap_or(1),
        query.size.unwrap_or(10),
        query.user_id.as_deref(),
    )?;
    Ok(Envelope::ok(page.map(|record| service.view(record))))
}

async fn delete(
    State(service): State<Arc<LinkService>>,
    Path(code): Path<String>,
) -> Result<Envelope<serde_json::Value>, ServiceError> {
    let record = service.delete(&code)?;
    let body = json!({ "shortCode": record.short_code });
    Ok(Envelope::ok(body).with_message("URL deleted successfully"))
}
