use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::extractors::{AdvertisementPath, JsonBody};
use crate::error::{ApiError, ApiResult};
use crate::logic::repository::AdvertisementRepository;
use crate::logic::validate::{validate_create, validate_json, InputSchema};
use crate::model::{Advertisement, AdvertisementId};
use crate::store::session::with_session;
use crate::store::traits::Store;

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: AdvertisementId,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
}

pub async fn create_advertisement<S: Store>(
    State(store): State<AppState<S>>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let created = with_session(store.as_ref(), move |session| {
        Box::pin(async move {
            let new_adv = validate_create(&body)?;
            AdvertisementRepository::new(session).create(new_adv).await
        })
    })
    .await?;

    log::info!("created advertisement {}", created.id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: created.id })))
}

pub async fn get_advertisement<S: Store>(
    State(store): State<AppState<S>>,
    AdvertisementPath(adv_id): AdvertisementPath,
) -> ApiResult<Json<Advertisement>> {
    let adv = with_session(store.as_ref(), move |session| {
        Box::pin(async move { AdvertisementRepository::new(session).get(adv_id).await })
    })
    .await?;

    Ok(Json(adv))
}

/// The id is resolved before the body is looked at, so an unknown id is
/// `NotFound` whatever was sent.
pub async fn update_advertisement<S: Store>(
    State(store): State<AppState<S>>,
    AdvertisementPath(adv_id): AdvertisementPath,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Json<Advertisement>> {
    let adv = with_session(store.as_ref(), move |session| {
        Box::pin(async move {
            let mut repo = AdvertisementRepository::new(session);
            let mut adv = repo.get(adv_id).await?;

            let JsonBody(raw) = body?;
            let fields = validate_json(&raw, InputSchema::Update)?;

            repo.update(&mut adv, fields).await?;
            Ok::<_, ApiError>(adv)
        })
    })
    .await?;

    Ok(Json(adv))
}

pub async fn delete_advertisement<S: Store>(
    State(store): State<AppState<S>>,
    AdvertisementPath(adv_id): AdvertisementPath,
) -> ApiResult<Json<DeletedResponse>> {
    with_session(store.as_ref(), move |session| {
        Box::pin(async move {
            let mut repo = AdvertisementRepository::new(session);
            let adv = repo.get(adv_id).await?;
            repo.delete(adv).await
        })
    })
    .await?;

    log::info!("deleted advertisement {adv_id}");
    Ok(Json(DeletedResponse { status: "deleted" }))
}
