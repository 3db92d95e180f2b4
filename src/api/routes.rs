//! Router assembly.

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, complete_task, create_task, health_check, list_tasks, root};

/// Builds the application router with tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/task/create-post", post(create_task))
        .route("/task/all", get(list_tasks))
        .route("/task/{id}", patch(complete_task))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
