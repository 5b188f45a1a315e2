//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod project;
pub mod project_type;

use axum::{
    Router,
    routing::{delete, get},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/", get(health::health_check))
        .route("/health", get(health::health_check))
        // Project endpoints
        .route(
            "/project",
            get(project::list_projects).post(project::create_project),
        )
        .route(
            "/project/{id}",
            get(project::get_project).delete(project::delete_project),
        )
        .route("/project/{id}/purge", delete(project::purge_project))
        // Project type endpoints
        .route(
            "/type",
            get(project_type::list_project_types).post(project_type::create_project_type),
        )
        .route(
            "/type/{slug}",
            get(project_type::get_project_type).delete(project_type::delete_project_type),
        )
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
