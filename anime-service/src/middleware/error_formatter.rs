//! Completes error bodies with request context
//!
//! Responses produced from [`crate::error::Error`] carry an [`ErrorReport`]
//! extension; this middleware re-renders them with `path`, `requestId` and,
//! when the request asked for `trace=true`, the `trace` field. Error responses
//! produced elsewhere (router fallbacks, timeouts, body limits, panics) get the
//! same body shape unless they are already JSON.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ErrorBody, ErrorReport};
use crate::ids::RequestId;

/// Longest plain-text body kept as the `message` of a rewritten error
const MAX_MESSAGE_BYTES: usize = 4096;

/// Whether the query string contains `trace=true`
pub fn wants_trace(query: Option<&str>) -> bool {
    query.is_some_and(|q| q.split('&').any(|pair| pair == "trace=true"))
}

pub async fn error_formatter(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let trace = wants_trace(request.uri().query());
    let request_id = RequestId::header_value(request.headers());

    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let report = response.extensions().get::<ErrorReport>().cloned();
    if report.is_none() && is_json(response.headers()) {
        return response;
    }

    let (mut parts, original) = response.into_parts();
    let (mut body, trace_text) = match report {
        Some(report) => (report.body, report.trace),
        None => (bare_body(status, original).await, status.to_string()),
    };
    body.path = Some(path);
    body.request_id = request_id;
    if trace {
        body.trace = Some(trace_text);
    }

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);
    (parts, Json(body)).into_response()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Body for an error response that did not come from [`crate::error::Error`]
///
/// Client errors keep their plain-text explanation as `message`; server
/// errors never expose theirs.
async fn bare_body(status: StatusCode, original: Body) -> ErrorBody {
    let body = ErrorBody::new(status);
    if !status.is_client_error() {
        return body;
    }
    match axum::body::to_bytes(original, MAX_MESSAGE_BYTES).await {
        Ok(bytes) if !bytes.is_empty() => {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            body.with_message(text)
        }
        _ => body,
    }
}
