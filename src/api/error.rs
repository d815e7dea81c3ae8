use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use pmf_core::error::CoreError;

/// Errors surfaced to HTTP clients as a `{"detail": ...}` body.
///
/// LLM-backed operations never produce `Upstream` — the resolver degrades
/// them to canned output. Only the transcription and research passthroughs
/// relay upstream failures verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("{0}")]
    Config(String),

    #[error("upstream returned status {status}")]
    Upstream { status: u16, detail: Value },
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound(id) => Self::NotFound(format!("Session {id} not found")),
            CoreError::InvalidState(msg) | CoreError::PreconditionFailed(msg) => {
                Self::BadRequest(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, Value::String(msg)),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, Value::String(msg)),
            Self::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Value::String(msg))
            }
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, Value::String(msg)),
            Self::Upstream { status, detail } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                detail,
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Decode an upstream body as JSON, falling back to wrapping the raw text.
pub fn json_detail(status: u16, body: &str) -> ApiError {
    let detail =
        serde_json::from_str(body).unwrap_or_else(|_| json!({ "detail": body }));
    ApiError::Upstream { status, detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_client_errors() {
        let e: ApiError = CoreError::NotFound("abc123".into()).into();
        assert!(matches!(e, ApiError::NotFound(_)));
        let e: ApiError = CoreError::not_live().into();
        assert!(matches!(e, ApiError::BadRequest(_)));
    }

    #[test]
    fn json_detail_passes_json_through() {
        let e = json_detail(503, r#"{"error": "down"}"#);
        match e {
            ApiError::Upstream { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail["error"], "down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn json_detail_wraps_plain_text() {
        let e = json_detail(500, "gateway exploded");
        match e {
            ApiError::Upstream { detail, .. } => {
                assert_eq!(detail["detail"], "gateway exploded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
