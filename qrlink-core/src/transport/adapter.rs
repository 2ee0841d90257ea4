use super::{Transport, WireRequest};
use crate::config::{Protocol, ServiceName};
use crate::error::{CallError, NetworkErrorKind, error_message};
use crate::metrics::{CallRecord, Metrics, MetricsSink, PerformanceTimer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A successful (2xx) exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub body: Value,
    pub status_code: u16,
    pub metrics: Metrics,
}

/// Executes wire requests under a fixed timeout and records one [`CallRecord`] per call.
pub struct TransportAdapter {
    protocol: Protocol,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    sink: Arc<dyn MetricsSink>,
}

impl TransportAdapter {
    pub fn new(
        protocol: Protocol,
        transport: Arc<dyn Transport>,
        timeout: Duration,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            protocol,
            transport,
            timeout,
            sink,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Performs exactly one call on the underlying transport.
    ///
    /// # Returns
    /// * `Ok(RawResponse)` - The service answered with a 2xx status.
    /// * `Err(CallError::Http)` - The service answered with another status.
    /// * `Err(CallError::Network)` - No response arrived (unreachable, broken, or timed out).
    pub async fn execute(
        &self,
        service: ServiceName,
        request: WireRequest,
    ) -> Result<RawResponse, CallError> {
        let timer = PerformanceTimer::start();
        let call = self.transport.execute(service, &request);
        let outcome = tokio::time::timeout(self.timeout, call).await;

        match outcome {
            Ok(Ok(response)) if (200..300).contains(&response.status) => {
                let metrics = timer.finish(response.status, response.size);
                debug!(
                    %service,
                    protocol = %self.protocol,
                    endpoint = %request.endpoint(),
                    status = response.status,
                    duration_ms = metrics.duration_millis,
                    "call succeeded"
                );
                self.record(service, &request, &metrics, None);

                Ok(RawResponse {
                    body: response.body,
                    status_code: response.status,
                    metrics,
                })
            }
            Ok(Ok(response)) => {
                let metrics = timer.finish(response.status, response.size);
                let message = error_message(response.status, &response.body);
                debug!(
                    %service,
                    protocol = %self.protocol,
                    endpoint = %request.endpoint(),
                    status = response.status,
                    %message,
                    "call answered with an error status"
                );
                self.record(service, &request, &metrics, Some(message.clone()));

                Err(CallError::Http {
                    status: response.status,
                    message,
                    body: response.body,
                    metrics,
                })
            }
            Ok(Err(err)) => {
                let metrics = timer.finish(0, 0);
                warn!(
                    %service,
                    protocol = %self.protocol,
                    endpoint = %request.endpoint(),
                    error = %err,
                    "call failed"
                );
                self.record(service, &request, &metrics, Some(err.message.clone()));

                Err(CallError::Network {
                    kind: err.kind,
                    message: err.message,
                    metrics,
                })
            }
            Err(_elapsed) => {
                let metrics = timer.finish(0, 0);
                let message = format!("no response within {} ms", self.timeout.as_millis());
                warn!(
                    %service,
                    protocol = %self.protocol,
                    endpoint = %request.endpoint(),
                    "call timed out"
                );
                self.record(service, &request, &metrics, Some(message.clone()));

                Err(CallError::Network {
                    kind: NetworkErrorKind::Timeout,
                    message,
                    metrics,
                })
            }
        }
    }

    fn record(
        &self,
        service: ServiceName,
        request: &WireRequest,
        metrics: &Metrics,
        error: Option<String>,
    ) {
        self.sink.record(CallRecord {
            service,
            endpoint: request.endpoint(),
            protocol: self.protocol,
            metrics: metrics.clone(),
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsLog;
    use crate::transport::{TransportError, WireResponse};
    use serde_json::json;

    struct Scripted(Result<WireResponse, TransportError>, Duration);

    #[async_trait::async_trait]
    impl Transport for Scripted {
        async fn execute(
            &self,
            _service: ServiceName,
            _request: &WireRequest,
        ) -> Result<WireResponse, TransportError> {
            tokio::time::sleep(self.1).await;
            self.0.clone()
        }
    }

    fn adapter(script: Scripted, timeout: Duration) -> (TransportAdapter, Arc<MetricsLog>) {
        let log = Arc::new(MetricsLog::new());
        let adapter = TransportAdapter::new(Protocol::Rest, Arc::new(script), timeout, log.clone());
        (adapter, log)
    }

    #[tokio::test]
    async fn success_records_one_entry() {
        let response = WireResponse {
            status: 200,
            body: json!({"status": "healthy"}),
            size: 20,
        };
        let script = Scripted(Ok(response), Duration::ZERO);
        let (adapter, log) = adapter(script, Duration::from_secs(1));

        let raw = adapter
            .execute(ServiceName::Analytics, WireRequest::get("/health"))
            .await
            .unwrap();

        assert_eq!(raw.status_code, 200);
        assert_eq!(raw.metrics.payload_size_bytes, 20);
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].endpoint, "/health");
    }

    #[tokio::test]
    async fn error_status_becomes_http_error_with_metrics() {
        let response = WireResponse {
            status: 404,
            body: json!({"success": false, "error": "NotFound", "message": "no such code"}),
            size: 60,
        };
        let script = Scripted(Ok(response), Duration::ZERO);
        let (adapter, log) = adapter(script, Duration::from_secs(1));

        let err = adapter
            .execute(
                ServiceName::UrlShortener,
                WireRequest::get("/api/v1/url/nope"),
            )
            .await
            .unwrap_err();

        match err {
            CallError::Http {
                status,
                message,
                metrics,
                ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "no such code");
                assert_eq!(metrics.status_code, 404);
            }
            other => panic!("expected an HTTP error, got {other:?}"),
        }
        assert_eq!(log.records()[0].error.as_deref(), Some("no such code"));
    }

    #[tokio::test]
    async fn transport_failure_has_status_zero() {
        let failure = TransportError::new(NetworkErrorKind::Unreachable, "connection refused");
        let script = Scripted(Err(failure), Duration::ZERO);
        let (adapter, log) = adapter(script, Duration::from_secs(1));

        let err = adapter
            .execute(ServiceName::QrGenerator, WireRequest::get("/health"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CallError::Network {
                kind: NetworkErrorKind::Unreachable,
                ..
            }
        ));
        assert_eq!(err.metrics().unwrap().status_code, 0);
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn slow_transport_times_out_within_bound() {
        let response = WireResponse {
            status: 200,
            body: json!({}),
            size: 2,
        };
        let timeout = Duration::from_millis(50);
        let (adapter, log) = adapter(Scripted(Ok(response), Duration::from_secs(5)), timeout);

        let err = adapter
            .execute(ServiceName::UrlShortener, WireRequest::get("/slow"))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        let duration = err.metrics().unwrap().duration_millis;
        assert!(duration >= 50.0);
        assert!(duration < 50.0 + 1000.0);
        assert_eq!(log.len(), 1);
    }
}
