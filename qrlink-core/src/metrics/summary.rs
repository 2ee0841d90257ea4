use super::CallRecord;
use crate::config::Protocol;
use serde::Serialize;
use std::cmp::Ordering;

/// Aggregate over the calls of one protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub protocol: Protocol,
    pub total_requests: usize,
    /// Mean `duration_millis`.
    pub average_response_time: f64,
    /// Percentage of calls answered with a 2xx status.
    pub success_rate: f64,
    /// Requests per second at the average response time.
    pub throughput: f64,
}

impl MetricsSummary {
    /// Summarizes the records of `protocol`. `None` when there are none.
    pub fn from_records(protocol: Protocol, records: &[CallRecord]) -> Option<Self> {
        let (count, total_millis, successes) = records
            .iter()
            .filter(|r| r.protocol == protocol)
            .fold((0usize, 0f64, 0usize), |(count, total, ok), r| {
                (
                    count + 1,
                    total + r.metrics.duration_millis,
                    ok + usize::from(r.is_success()),
                )
            });

        if count == 0 {
            return None;
        }

        let average_response_time = total_millis / count as f64;
        let throughput = if average_response_time > 0.0 {
            1000.0 / average_response_time
        } else {
            0.0
        };

        Some(Self {
            protocol,
            total_requests: count,
            average_response_time,
            success_rate: successes as f64 / count as f64 * 100.0,
            throughput,
        })
    }
}

/// Records and summary for one protocol, as shown by the analytics views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub protocol: Protocol,
    pub records: Vec<CallRecord>,
    pub summary: Option<MetricsSummary>,
}

/// Side-by-side view of both protocols with a winner per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolComparison {
    pub rest: Option<MetricsSummary>,
    pub rpc: Option<MetricsSummary>,
    /// Lower average response time. `None` on a tie or missing data.
    pub faster: Option<Protocol>,
    /// Higher success rate. `None` on a tie or missing data.
    pub more_reliable: Option<Protocol>,
}

impl ProtocolComparison {
    pub fn from_records(records: &[CallRecord]) -> Self {
        let rest = MetricsSummary::from_records(Protocol::Rest, records);
        let rpc = MetricsSummary::from_records(Protocol::Rpc, records);

        let faster = winner(&rest, &rpc, |s| -s.average_response_time);
        let more_reliable = winner(&rest, &rpc, |s| s.success_rate);

        Self {
            rest,
            rpc,
            faster,
            more_reliable,
        }
    }
}

fn winner(
    rest: &Option<MetricsSummary>,
    rpc: &Option<MetricsSummary>,
    score: impl Fn(&MetricsSummary) -> f64,
) -> Option<Protocol> {
    let (rest, rpc) = (rest.as_ref()?, rpc.as_ref()?);
    match score(rest).partial_cmp(&score(rpc))? {
        Ordering::Greater => Some(Protocol::Rest),
        Ordering::Less => Some(Protocol::Rpc),
        Ordering::Equal => None,
    }
}
