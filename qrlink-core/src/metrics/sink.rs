use super::{Metrics, MetricsSummary, PerformanceReport};
use crate::config::{Protocol, ServiceName};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// One entry of the metrics log: which call was made and how it went.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub service: ServiceName,
    pub endpoint: String,
    pub protocol: Protocol,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.metrics.is_success()
    }
}

/// Destination of call records. Owned by the caller and shared with the clients.
pub trait MetricsSink: Send + Sync {
    fn record(&self, record: CallRecord);
}

/// In-memory log of call records, in arrival order.
///
/// A bounded log drops its oldest record once `capacity` is reached.
#[derive(Debug, Default)]
pub struct MetricsLog {
    records: Mutex<VecDeque<CallRecord>>,
    capacity: Option<usize>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log keeping at most the `capacity` most recent records.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<CallRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A snapshot of every record, in arrival order.
    pub fn records(&self) -> Vec<CallRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Records and summary of the calls made under `protocol`.
    pub fn report(&self, protocol: Protocol) -> PerformanceReport {
        let records: Vec<CallRecord> = self
            .lock()
            .iter()
            .filter(|r| r.protocol == protocol)
            .cloned()
            .collect();
        let summary = MetricsSummary::from_records(protocol, &records);

        PerformanceReport {
            protocol,
            records,
            summary,
        }
    }
}

impl MetricsSink for MetricsLog {
    fn record(&self, record: CallRecord) {
        let mut records = self.lock();
        if let Some(capacity) = self.capacity {
            while records.len() >= capacity {
                records.pop_front();
            }
        }
        records.push_back(record);
    }
}

impl MetricsSink for mpsc::UnboundedSender<CallRecord> {
    fn record(&self, record: CallRecord) {
        if self.send(record).is_err() {
            tracing::debug!("metrics receiver dropped, call record discarded");
        }
    }
}
