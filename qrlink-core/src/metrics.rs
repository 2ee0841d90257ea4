//! # Call metrics
//!
//! Every logical call produces exactly one [`Metrics`] record, on the success path and on
//! the failure path alike. Records are wrapped into a [`CallRecord`] and pushed into a
//! caller-owned [`MetricsSink`]; [`MetricsLog`] is the in-memory sink the CLI and the
//! analytics views summarize from.
pub mod sink;
pub mod summary;
pub mod timer;

pub use sink::{CallRecord, MetricsLog, MetricsSink};
pub use summary::{MetricsSummary, PerformanceReport, ProtocolComparison};
pub use timer::PerformanceTimer;

use serde::{Deserialize, Serialize};

/// Timing, size and status of one call. Created once by [`PerformanceTimer::finish`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Wall-clock span between dispatch and response (or error) resolution.
    pub duration_millis: f64,
    /// Resident memory growth over the call. Best-effort, 0 when unavailable.
    pub memory_delta_bytes: i64,
    /// RFC 3339 timestamp of the moment the call resolved.
    pub timestamp: String,
    /// HTTP status of the response, 0 when no response arrived.
    pub status_code: u16,
    pub payload_size_bytes: usize,
}

impl Metrics {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
