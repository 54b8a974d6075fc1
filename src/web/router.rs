//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{
    delete_file, editor_callback, get_editor_config, health_check, list_files, upload_file,
    AppState,
};
use super::middleware::create_cors_layer;

/// Create the main router.
///
/// Stored documents are served read-only under `/files`, which is also the
/// address handed to the editor for downloading them.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .route("/files", get(list_files).post(upload_file))
        .route("/files/:id", delete(delete_file))
        .route("/editor/:id", get(get_editor_config))
        .route("/editor-callback/:id", post(editor_callback))
        .layer(DefaultBodyLimit::max(app_state.max_upload_size));

    let files = ServeDir::new(app_state.registry.root());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .nest_service("/files", files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}
