use axum::{
    response::Response,
    routing::{get, post, MethodRouter},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::handlers;
use crate::error::ApiError;
use crate::store::traits::Store;

pub fn create_router<S: Store>() -> Router<Arc<S>> {
    let collection = || -> MethodRouter<Arc<S>> { post(handlers::create_advertisement::<S>) };
    let item = || -> MethodRouter<Arc<S>> {
        get(handlers::get_advertisement::<S>)
            .patch(handlers::update_advertisement::<S>)
            .delete(handlers::delete_advertisement::<S>)
    };

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Advertisements, with and without the trailing slash
        .route("/advertisement/", collection())
        .route("/advertisement", collection())
        .route("/advertisement/:adv_id/", item())
        .route("/advertisement/:adv_id", item())
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn handle_panic(_payload: Box<dyn Any + Send + 'static>) -> Response {
    log::error!("request handler panicked");
    ApiError::internal_response()
}
