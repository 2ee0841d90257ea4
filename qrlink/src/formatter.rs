use colored::*;
use qrlink_core::client::OperationResult;
use qrlink_core::config::{Protocol, ServiceName};
use qrlink_core::error::CallError;
use qrlink_core::metrics::{Metrics, MetricsSummary, ProtocolComparison};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct HealthReport(pub BTreeMap<ServiceName, Value>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<Value> for FormattedString {
    fn from(value: Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<&Metrics> for FormattedString {
    fn from(metrics: &Metrics) -> Self {
        FormattedString(format!(
            "{} {:.2} ms  {} {}  {} {} bytes",
            "time".dimmed(),
            metrics.duration_millis,
            "status".dimmed(),
            metrics.status_code,
            "size".dimmed(),
            metrics.payload_size_bytes
        ))
    }
}

impl From<OperationResult> for FormattedString {
    fn from(result: OperationResult) -> Self {
        let mut out = format!(
            "{} {}\n",
            "OK".green().bold(),
            FormattedString::from(&result.metrics).0
        );
        if let Some(message) = &result.message {
            out.push_str(&format!("{}\n", message.cyan()));
        }
        out.push_str(&FormattedString::from(Value::Object(result.payload)).0);
        FormattedString(out)
    }
}

impl From<CallError> for FormattedString {
    fn from(err: CallError) -> Self {
        let label = match &err {
            CallError::Validation(_) => "Invalid Input:",
            CallError::CapabilityUnsupported { .. } => "Not Supported:",
            CallError::Network { .. } => "Network Error:",
            CallError::Http { .. } if err.is_permanent() => "Not Implemented:",
            CallError::Http { .. } => "Request Failed:",
        };

        let mut out = format!("{}\n\n'{}'", label.red().bold(), err);
        if let Some(metrics) = err.metrics() {
            out.push_str(&format!("\n\n{}", FormattedString::from(metrics).0));
        }
        FormattedString(out)
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<HealthReport> for FormattedString {
    fn from(HealthReport(services): HealthReport) -> Self {
        if services.is_empty() {
            return FormattedString("No services configured.".yellow().to_string());
        }

        let mut out = String::from("Service Health:\n");
        for (service, health) in services {
            let status = health
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN");
            let status = if status.eq_ignore_ascii_case("healthy") {
                status.green()
            } else {
                status.red()
            };
            out.push_str(&format!("  - {:<16} {}", service.as_str(), status));
            if let Some(error) = health.get("error").and_then(Value::as_str) {
                out.push_str(&format!(" ({})", error.dimmed()));
            }
            out.push('\n');
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<ProtocolComparison> for FormattedString {
    fn from(comparison: ProtocolComparison) -> Self {
        let mut out = format!(
            "{:<10} {:>10} {:>14} {:>10} {:>12}\n",
            "protocol".cyan(),
            "requests".cyan(),
            "avg ms".cyan(),
            "success %".cyan(),
            "req/s".cyan()
        );
        for summary in [&comparison.rest, &comparison.rpc].into_iter().flatten() {
            out.push_str(&summary_row(summary));
        }

        let verdict = |winner: Option<Protocol>| match winner {
            Some(protocol) => format!("{protocol}").green().bold().to_string(),
            None => "tie".yellow().to_string(),
        };
        out.push_str(&format!("\nFaster:        {}", verdict(comparison.faster)));
        out.push_str(&format!("\nMore reliable: {}", verdict(comparison.more_reliable)));
        FormattedString(out)
    }
}

fn summary_row(summary: &MetricsSummary) -> String {
    format!(
        "{:<10} {:>10} {:>14.2} {:>10.1} {:>12.1}\n",
        summary.protocol.as_str(),
        summary.total_requests,
        summary.average_response_time,
        summary.success_rate,
        summary.throughput
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(protocol: Protocol, average_response_time: f64) -> MetricsSummary {
        MetricsSummary {
            protocol,
            total_requests: 3,
            average_response_time,
            success_rate: 100.0,
            throughput: 1000.0 / average_response_time,
        }
    }

    #[test]
    fn health_report_flags_failing_services() {
        colored::control::set_override(false);
        let report = HealthReport(BTreeMap::from([
            (ServiceName::UrlShortener, json!({ "status": "healthy" })),
            (
                ServiceName::UserManagement,
                json!({ "status": "ERROR", "error": "connection refused" }),
            ),
        ]));

        let out = FormattedString::from(report).0;
        assert!(out.contains("urlShortener"));
        assert!(out.contains("healthy"));
        assert!(out.contains("ERROR (connection refused)"));
    }

    #[test]
    fn comparison_names_the_winners() {
        colored::control::set_override(false);
        let comparison = ProtocolComparison {
            rest: Some(summary(Protocol::Rest, 12.0)),
            rpc: Some(summary(Protocol::Rpc, 4.0)),
            faster: Some(Protocol::Rpc),
            more_reliable: None,
        };

        let out = FormattedString::from(comparison).0;
        assert!(out.contains("Faster:        RPC"));
        assert!(out.contains("More reliable: tie"));
        let rows = out
            .lines()
            .filter(|l| l.starts_with("REST") || l.starts_with("RPC"));
        assert_eq!(rows.count(), 2);
    }
}
