//! # Call errors
//!
//! Four kinds of failure reach the caller of a logical operation. `Validation` and
//! `CapabilityUnsupported` are raised before any network call. `Network` and `Http` are
//! raised by the transport adapter and always carry the [`Metrics`] captured up to the
//! failure point, so failed calls still take part in protocol comparisons.
use crate::client::Operation;
use crate::config::Protocol;
use crate::metrics::Metrics;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The call did not resolve within the adapter timeout.
    Timeout,
    /// The peer could not be reached (connection refused, DNS, unavailable channel).
    Unreachable,
    /// Any other transport level failure (broken connection, malformed frames).
    Transport,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkErrorKind::Timeout => f.write_str("timeout"),
            NetworkErrorKind::Unreachable => f.write_str("unreachable"),
            NetworkErrorKind::Transport => f.write_str("transport"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Invalid input: '{0}'")]
    Validation(String),

    #[error("'{operation}' is not available over {protocol}")]
    CapabilityUnsupported {
        operation: Operation,
        protocol: Protocol,
    },

    #[error("Network error ({kind}): '{message}'")]
    Network {
        kind: NetworkErrorKind,
        message: String,
        metrics: Metrics,
    },

    #[error("Request failed with status {status}: '{message}'")]
    Http {
        status: u16,
        message: String,
        body: serde_json::Value,
        metrics: Metrics,
    },
}

impl CallError {
    /// Metrics captured up to the failure point. `None` for errors raised before dispatch.
    pub fn metrics(&self) -> Option<&Metrics> {
        match self {
            CallError::Network { metrics, .. } | CallError::Http { metrics, .. } => Some(metrics),
            CallError::Validation(_) | CallError::CapabilityUnsupported { .. } => None,
        }
    }

    /// Best known status code; 0 when no response arrived.
    pub fn status_code(&self) -> u16 {
        match self {
            CallError::Http { status, .. } => *status,
            _ => 0,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CallError::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            }
        )
    }

    /// Errors that will not go away by repeating the call: invalid input, operations the
    /// protocol does not offer, and endpoints answering 501 Not Implemented.
    pub fn is_permanent(&self) -> bool {
        match self {
            CallError::Validation(_) | CallError::CapabilityUnsupported { .. } => true,
            CallError::Http { status, .. } => *status == 501,
            CallError::Network { .. } => false,
        }
    }
}

/// Extracts a human readable message from an error body.
///
/// REST envelopes carry `message` (and `error`), transcoded RPC errors carry `message`.
pub(crate) fn error_message(status: u16, body: &serde_json::Value) -> String {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .or_else(|| body.as_str().filter(|s| !s.is_empty()).map(str::to_string))
        .unwrap_or_else(|| {
            http::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unknown status")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceTimer;
    use serde_json::json;

    #[test]
    fn not_implemented_is_permanent() {
        let body = json!({
            "success": false,
            "error": "NotImplemented",
            "message": "User login endpoint - Implementation pending",
        });
        let err = CallError::Http {
            status: 501,
            message: error_message(501, &body),
            body,
            metrics: PerformanceTimer::start().finish(501, 0),
        };

        assert!(err.is_permanent());
        assert_eq!(err.status_code(), 501);
        assert!(err.metrics().is_some());
        assert!(err.to_string().contains("Implementation pending"));
    }

    #[test]
    fn network_errors_are_transient() {
        let err = CallError::Network {
            kind: NetworkErrorKind::Timeout,
            message: "deadline elapsed".to_string(),
            metrics: PerformanceTimer::start().finish(0, 0),
        };

        assert!(err.is_timeout());
        assert!(!err.is_permanent());
        assert_eq!(err.status_code(), 0);
    }

    #[test]
    fn error_message_falls_back_to_reason_phrase() {
        assert_eq!(error_message(404, &json!({})), "Not Found");
        assert_eq!(error_message(500, &json!("boom")), "boom");
        let body = json!({"code": 3, "message": "bad url"});
        assert_eq!(error_message(400, &body), "bad url");
    }
}
