use crate::envelope::Envelope;
use crate::store::KeySpaceExhausted;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

/// Failures of a service operation, shared by the REST and RPC surfaces.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    KeySpaceExhausted(#[from] KeySpaceExhausted),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Name sent in the `error` field of the REST envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "ValidationError",
            ServiceError::NotFound(_) => "NotFound",
            ServiceError::Conflict(_) => "Conflict",
            ServiceError::KeySpaceExhausted(_) => "KeySpaceExhausted",
            ServiceError::Internal(_) => "InternalServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::KeySpaceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            ServiceError::Internal(_) | ServiceError::KeySpaceExhausted(_)
        ) {
            tracing::error!(error = %self, "request failed");
        }
        Envelope::error(self.kind(), self.to_string()).with_status(self.status())
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<ServiceError> for tonic::Status {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => tonic::Status::invalid_argument(message),
            ServiceError::NotFound(message) => tonic::Status::not_found(message),
            ServiceError::Conflict(message) => tonic::Status::already_exists(message),
            ServiceError::KeySpaceExhausted(e) => tonic::Status::resource_exhausted(e.to_string()),
            ServiceError::Internal(message) => tonic::Status::internal(message),
        }
    }
}

/// Failures starting or running a server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to '{addr}': '{source}'")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Server error: '{0}'")]
    Serve(#[source] std::io::Error),
    #[error("Failed to build the reflection service: '{0}'")]
    Reflection(#[from] tonic_reflection::server::Error),
    #[error(transparent)]
    Schema(#[from] qrlink_core::transcoding::TranscodingError),
}
