use crate::config::{Protocol, ServiceName};
use crate::metrics::{MetricsLog, PerformanceReport};
use crate::transport::{TransportAdapter, WireRequest};
use futures_util::future::join_all;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Health checks over the configured services and reports over the metrics log.
pub struct Analytics {
    adapter: Arc<TransportAdapter>,
    services: Vec<ServiceName>,
}

impl Analytics {
    pub fn new(adapter: Arc<TransportAdapter>, services: Vec<ServiceName>) -> Self {
        Self { adapter, services }
    }

    pub fn protocol(&self) -> Protocol {
        self.adapter.protocol()
    }

    /// Calls `GET /health` once on every configured service.
    ///
    /// A service that cannot answer is reported as `{status: "ERROR", error}`; the check is
    /// not retried.
    pub async fn service_health(&self) -> BTreeMap<ServiceName, Value> {
        let checks = self.services.iter().map(|service| async move {
            let request = WireRequest::get("/health");
            let health = match self.adapter.execute(*service, request).await {
                Ok(raw) => raw.body,
                Err(err) => json!({ "status": "ERROR", "error": err.to_string() }),
            };
            (*service, health)
        });

        join_all(checks).await.into_iter().collect()
    }

    pub fn performance_report(&self, log: &MetricsLog) -> PerformanceReport {
        log.report(self.protocol())
    }
}
