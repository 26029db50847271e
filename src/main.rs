use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tpq_admin::api::router;
use tpq_admin::cloud::{BlobStoreConfig, JsonBlobHttpClient};
use tpq_admin::config::AppConfig;
use tpq_admin::db::SqliteStorage;
use tpq_admin::report::GeminiReportClient;
use tpq_admin::services::{SessionService, StoreService, SyncService};
use tpq_admin::state::AppState;
use tpq_admin::sync::LastWriterWins;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tpq_admin=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    let storage = SqliteStorage::new(pool);
    storage.migrate().await?;
    let storage = Arc::new(storage);

    let store = Arc::new(StoreService::load(storage.clone()).await?);
    let remote = Arc::new(JsonBlobHttpClient::new(BlobStoreConfig::new(
        config.sync_base_url.clone(),
    ))?);
    let sync = Arc::new(SyncService::new(
        store.clone(),
        remote,
        Arc::new(LastWriterWins),
    ));
    let session = Arc::new(SessionService::new(storage, config.admin.clone()));
    let reports = Arc::new(GeminiReportClient::new(config.report.clone())?);

    let state = AppState {
        store,
        sync,
        session,
        reports,
        monthly_fee: config.monthly_fee,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
