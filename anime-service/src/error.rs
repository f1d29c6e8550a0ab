//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::RepositoryError;

/// Fixed `developmentMessage` carried by domain error bodies
pub const DEVELOPMENT_MESSAGE: &str = "a custom ResponseStatusException";

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Domain classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Requested id has no record
    NotFound,
    /// Invalid input, including batch items that fail validation
    BadRequest,
    /// Everything else
    Unclassified,
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Store failure
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authorization error
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request refused by an extractor with its own status (413, 415)
    #[error("Request rejected: {message}")]
    Rejected { status: StatusCode, message: String },

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::BadRequest(_) => ErrorKind::BadRequest,
            _ => ErrorKind::Unclassified,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Rejected { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients
    ///
    /// Unclassified failures never expose their internal detail.
    pub fn public_message(&self) -> String {
        match self {
            Error::NotFound(msg)
            | Error::BadRequest(msg)
            | Error::Unauthorized(msg)
            | Error::Forbidden(msg)
            | Error::Rejected { message: msg, .. } => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Debug rendering followed by the source chain
    pub fn trace(&self) -> String {
        let mut out = format!("{self:?}");
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\nCaused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// HTTP status code
    pub status: u16,

    /// Status reason phrase
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorBody {
    /// Bare body for a status code, without domain fields
    pub fn new(status: StatusCode) -> Self {
        Self {
            timestamp: Utc::now(),
            path: None,
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
            message: None,
            development_message: None,
            request_id: None,
            trace: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Error details attached to a response for the error formatter middleware
///
/// The formatter completes the body with request context (path, request id,
/// and the trace when asked for) before it leaves the server.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub body: ErrorBody,
    pub trace: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        let mut body = ErrorBody::new(err.status_code()).with_message(err.public_message());
        if err.kind() != ErrorKind::Unclassified {
            body.development_message = Some(DEVELOPMENT_MESSAGE.to_string());
        }
        body
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::Unclassified if self.status_code().is_server_error() => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        let body = ErrorBody::from(&self);
        let report = ErrorReport {
            body: body.clone(),
            trace: self.trace(),
        };
        let mut response = (self.status_code(), Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_kind_and_status() {
        let not_found = Error::NotFound("Anime not found".into());
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let bad = Error::BadRequest("Invalid Name".into());
        assert_eq!(bad.kind(), ErrorKind::BadRequest);
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let repo: Error = RepositoryError::connection_failed("refused").into();
        assert_eq!(repo.kind(), ErrorKind::Unclassified);
        assert_eq!(repo.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_domain_body_carries_development_message() {
        let body = ErrorBody::from(&Error::NotFound("Anime not found".into()));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["message"], "Anime not found");
        assert_eq!(json["developmentMessage"], DEVELOPMENT_MESSAGE);
        assert!(json.get("trace").is_none());
        assert!(json.get("path").is_none());
    }

    #[test]
    fn test_unclassified_body_hides_detail() {
        let err: Error =
            RepositoryError::database_error(RepositoryOperation::Save, "password=hunter2")
                .into();
        let body = ErrorBody::from(&err);

        assert_eq!(body.status, 500);
        assert_eq!(body.message.as_deref(), Some("Internal server error"));
        assert!(body.development_message.is_none());
    }

    #[test]
    fn test_trace_includes_debug_rendering() {
        let err = Error::Io(std::io::Error::other("disk gone"));
        let trace = err.trace();

        assert!(trace.starts_with("Io("));
        assert!(trace.contains("disk gone"));
    }

    #[test]
    fn test_rejection_keeps_status_and_message() {
        let err = Error::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".into(),
        };
        let body = ErrorBody::from(&err);

        assert_eq!(err.kind(), ErrorKind::Unclassified);
        assert_eq!(body.status, 415);
        assert!(body.message.unwrap().contains("Content-Type"));
        assert!(body.development_message.is_none());
    }

    #[test]
    fn test_into_response_attaches_report() {
        let response = Error::BadRequest("Invalid Name".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.body.message.as_deref(), Some("Invalid Name"));
        assert!(report.trace.contains("BadRequest"));
    }
}
