mod api;
mod config;
mod id;
mod models;
mod redirect;
mod service;
mod storage;

use anyhow::Result;
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::{Config, DatabaseBackend};
use service::LinkService;
use storage::{PostgresStorage, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let service = Arc::new(LinkService::new(
        storage,
        config.public_base_url.clone(),
        Duration::from_millis(config.store_timeout_ms),
    ));

    let redirect_status = StatusCode::from_u16(config.redirect_status)?;

    // Static routes (/api/..., /health) take precedence over the
    // /{short_id} capture, so both routers share one listener.
    let app = api::create_api_router(Arc::clone(&service), &config.allowed_origins)
        .merge(redirect::create_redirect_router(service, redirect_status))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - API endpoints available at http://{}/api/...", addr);
    info!("   - Short links served from http://{}/", addr);
    info!("   - CORS enabled for: {}", config.allowed_origins.join(", "));

    axum::serve(listener, app).await?;

    Ok(())
}
