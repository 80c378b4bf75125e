use advert_db_rust::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Info by default, RUST_LOG overrides; sqlx statement logging stays quiet
    use env_logger::{Builder, Env};
    use log::LevelFilter;

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("sqlx", LevelFilter::Warn)
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{} backend={:?}",
        config.server.host,
        config.server.port,
        config.database.backend
    );

    advert_db_rust::run_server(config).await
}
