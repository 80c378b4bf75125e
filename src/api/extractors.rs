use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, FieldError};
use crate::model::AdvertisementId;

/// Axum extractor for the `{adv_id}` path segment.
///
/// A segment that is not an integer cannot name an advertisement, so it is
/// answered as `NotFound` rather than as a framework rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisementPath(pub AdvertisementId);

#[async_trait]
impl<S> FromRequestParts<S> for AdvertisementPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<AdvertisementId>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| Self(id))
            .map_err(|_| ApiError::NotFound)
    }
}

/// Raw JSON request body, left undecoded for the input validator.
///
/// Unreadable bodies are reported through the regular error envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::InvalidInput(vec![body_error(&rejection)])),
        }
    }
}

fn body_error(rejection: &JsonRejection) -> FieldError {
    let kind = match rejection {
        JsonRejection::MissingJsonContentType(_) => "content_type",
        JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => "json_invalid",
        _ => "body_unreadable",
    };
    FieldError::new(&[], kind, rejection.body_text())
}
