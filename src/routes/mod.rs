//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the desk websocket, the upload/download endpoints and a health
//! check under one Axum router. Every other path falls through to the static
//! assets in the configured public directory.

pub mod files;
pub mod ws;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let public = ServeDir::new(&state.config.public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route(
            "/upload/{desk}/{group_id}",
            post(files::upload).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/download/{desk}/{file_id}",
            get(files::download).layer(CompressionLayer::new()),
        )
        .route("/healthz", get(healthz))
        .fallback_service(public)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
