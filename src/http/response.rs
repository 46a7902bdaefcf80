//! Response building.
//!
//! # Responsibilities
//! - Map local failures to status codes with a JSON `{"error": ...}` body
//! - Relay vendor responses with their original status and body
//!
//! # Design Decisions
//! - Vendor statuses are never rewritten, including 4xx/5xx
//! - An unreachable vendor results in 502 Bad Gateway

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::CredentialError;
use crate::upstream::{RequestError, UpstreamError, UpstreamResponse};

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing {0} parameter")]
    MissingParameter(&'static str),

    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    #[error("invalid request body: {0}")]
    MalformedBody(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_)
            | ApiError::InvalidRequest(_)
            | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(UpstreamError::Credential(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        ApiError::Upstream(UpstreamError::Credential(err))
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Relay a vendor response verbatim.
pub fn relay(upstream: UpstreamResponse) -> Response {
    let content_type = upstream
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingParameter("task_id").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(RequestError::MissingPromptOrImage).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::Upstream(UpstreamError::Url("x".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::MissingParameter("task_id").to_string(), "missing task_id parameter");
        assert_eq!(
            ApiError::from(RequestError::MissingPromptOrImage).to_string(),
            "missing prompt or image parameter"
        );
        assert_eq!(ApiError::MethodNotAllowed.to_string(), "Method Not Allowed");
    }

    #[test]
    fn test_relay_keeps_status() {
        let response = relay(UpstreamResponse {
            status: StatusCode::TOO_MANY_REQUESTS,
            content_type: None,
            body: Bytes::from_static(b"{\"code\":1302}"),
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
