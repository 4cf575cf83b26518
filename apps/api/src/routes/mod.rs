pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::report::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Tailoring sessions
        .route("/api/v1/tailor", post(handlers::handle_tailor))
        .route("/api/v1/tailor/:key", get(handlers::handle_get_report))
        .route(
            "/api/v1/tailor/:key/regions",
            post(handlers::handle_request_regions),
        )
        // Builder flow
        .route("/api/v1/resume/structure", post(handlers::handle_structure))
        .route("/api/v1/resume/polish", post(handlers::handle_polish))
        // Standalone utilities
        .route("/api/v1/ats/preview", post(handlers::handle_ats_preview))
        .route("/api/v1/extract", post(handlers::handle_extract))
        .with_state(state)
}
