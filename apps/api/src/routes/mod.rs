pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resumes::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/resumes", get(handlers::handle_list))
        .route("/api/v1/resumes/active", get(handlers::handle_get_active))
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get).delete(handlers::handle_delete),
        )
        .route(
            "/api/v1/resumes/:id/status",
            get(handlers::handle_get_status),
        )
        .route(
            "/api/v1/resumes/:id/reprocess",
            post(handlers::handle_reprocess),
        )
        .with_state(state)
}
