mod config;
mod db;
mod frame;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::storage::{MemoryStorage, PgStorage, StorageGateway};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let config = config::Config::from_env();

    let storage: Arc<dyn StorageGateway> = match &config.database_url {
        Some(url) => match db::init_pool(url, config.db_max_connections).await {
            Ok(pool) => Arc::new(PgStorage::new(pool)),
            Err(e) => {
                tracing::error!(error = %e, "database init failed");
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("DATABASE_URL not set; desk files are kept in memory only");
            Arc::new(MemoryStorage::new())
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        tracing::error!(error = %e, dir = %config.upload_dir.display(), "could not create upload directory");
        std::process::exit(1);
    }

    let port = config.port;
    let state = state::AppState::new(storage, config);
    let app = routes::app(state);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%port, "sharedesk listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
    }
}
