//! Domain errors and the single place they are turned into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// One entry in an `InvalidInput` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Path to the offending value; empty for the body itself.
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], kind: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: loc.iter().map(|segment| segment.to_string()).collect(),
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input ({} field error(s))", .0.len())]
    InvalidInput(Vec<FieldError>),

    #[error("advertisement not found")]
    NotFound,

    #[error("advertisement already exists")]
    Conflict,

    /// Anything the domain does not classify. Never shown to the client.
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The generic response used for every unclassified failure.
    pub fn internal_response() -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Text(String),
    Fields(Vec<FieldError>),
}

/// `{"status": "error", "message": ...}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: ErrorMessage,
}

impl ErrorEnvelope {
    pub fn new(message: ErrorMessage) -> Self {
        Self {
            status: "error",
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::InvalidInput(errors) => ErrorMessage::Fields(errors),
            ApiError::Internal(err) => {
                log::error!("unhandled failure while serving request: {err:#}");
                return Self::internal_response();
            }
            other => ErrorMessage::Text(other.to_string()),
        };

        (status, Json(ErrorEnvelope::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "error", "message": "advertisement not found"})
        );
    }

    #[tokio::test]
    async fn test_conflict_envelope() {
        let response = ApiError::Conflict.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["message"], "advertisement already exists");
    }

    #[tokio::test]
    async fn test_invalid_input_carries_field_list() {
        let errors = vec![FieldError::new(&["title"], "missing", "field required")];
        let response = ApiError::InvalidInput(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(
            body["message"],
            serde_json::json!([{"loc": ["title"], "msg": "field required", "type": "missing"}])
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let err = ApiError::from(anyhow::anyhow!("password authentication failed for user"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let text = body_text(response).await;
        assert!(!text.contains("password"));
    }
}
