//! # Analytics service
//!
//! Aggregates the health of the configured services through the client facade, and reports
//! the call records those checks produced.
use crate::envelope::Envelope;
use crate::error::ServiceError;
use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use qrlink_core::client::ClientFactory;
use qrlink_core::config::{ClientConfig, Protocol};
use qrlink_core::metrics::{MetricsLog, PerformanceReport, ProtocolComparison};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Records kept for `/api/v1/metrics`. Older records are dropped first.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct AnalyticsState {
    config: ClientConfig,
    log: Arc<MetricsLog>,
}

impl AnalyticsState {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_log_capacity(config, DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(config: ClientConfig, capacity: usize) -> Self {
        Self {
            config,
            log: Arc::new(MetricsLog::bounded(capacity)),
        }
    }

    pub fn log(&self) -> &MetricsLog {
        &self.log
    }
}

#[derive(Debug, Deserialize)]
struct HealthQuery {
    protocol: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServicesHealth {
    protocol: Protocol,
    overall: &'static str,
    services: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsView {
    rest: PerformanceReport,
    rpc: PerformanceReport,
    comparison: ProtocolComparison,
}

pub fn router(state: AnalyticsState) -> Router {
    Router::new()
        .route("/api/v1/health/services", get(services_health))
        .route("/api/v1/metrics", get(metrics))
        .with_state(state)
}

async fn services_health(
    State(state): State<AnalyticsState>,
    query: Result<Query<HealthQuery>, QueryRejection>,
) -> Result<Envelope<ServicesHealth>, ServiceError> {
    let Query(query) = query?;
    let protocol = match query.protocol {
        Some(value) => value.parse::<Protocol>().map_err(ServiceError::Validation)?,
        None => Protocol::Rest,
    };

    let clients = ClientFactory::create(protocol, &state.config, state.log.clone())
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    let health = clients.analytics.service_health().await;

    let overall = if health.values().all(is_healthy) {
        "healthy"
    } else {
        "degraded"
    };
    tracing::debug!(%protocol, overall, "aggregated service health");

    Ok(Envelope::ok(ServicesHealth {
        protocol,
        overall,
        services: health
            .into_iter()
            .map(|(service, value)| (service.to_string(), value))
            .collect(),
    }))
}

async fn metrics(State(state): State<AnalyticsState>) -> Envelope<MetricsView> {
    let records = state.log.records();

    Envelope::ok(MetricsView {
        rest: state.log.report(Protocol::Rest),
        rpc: state.log.report(Protocol::Rpc),
        comparison: ProtocolComparison::from_records(&records),
    })
}

fn is_healthy(health: &Value) -> bool {
    health
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| status.eq_ignore_ascii_case("healthy"))
}
