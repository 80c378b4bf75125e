pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{ApiError, ApiResult, ErrorEnvelope, FieldError};
pub use logic::{validate_create, validate_json, AdvertisementRepository, FieldMap, InputSchema};

// Export all model types
pub use model::*;

// Export store types
pub use store::{with_session, MemoryStore, PostgresStore, Store, StoreError, StoreSession};

use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};

/// Connect the configured store and serve until interrupted.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.database.backend {
        StoreBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::new(&config.database_url(), config.max_connections()).await?;

            log::info!("Running database migrations...");
            store.migrate().await?;

            serve(Arc::new(store), &config).await
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on shutdown");
            serve(Arc::new(MemoryStore::new()), &config).await
        }
    }
}

async fn serve<S: Store>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    let app = routes::create_router().with_state(store);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Advertisement server running on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
