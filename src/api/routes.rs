use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and text fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.upload.max_upload_size as usize + MULTIPART_OVERHEAD;

    Router::new()
        // Notes
        .route(
            "/upload",
            post(handlers::upload_note).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files", get(handlers::list_notes))
        .route("/files/file/:filename", get(handlers::serve_file))
        .route("/download/:id", get(handlers::download_note))
        // Accounts
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
