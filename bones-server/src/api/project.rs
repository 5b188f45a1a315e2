//! Project API Handlers
//!
//! HTTP endpoints for the project lifecycle. Create and delete answer as soon
//! as the pipeline run is launched; clients poll `GET /project/{id}`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bones_core::domain::project::Project;
use bones_core::dto::project::CreateProject;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::AppState;
use crate::service::project_service;

/// POST /project
/// Create a project and launch its generate run
pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    tracing::info!("Creating project '{}' of type {}", req.name, req.type_slug);

    let project = project_service::create_project(&state, req).await?;

    Ok((StatusCode::ACCEPTED, Json(project)))
}

/// GET /project
/// List all projects
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    tracing::debug!("Listing all projects");

    let projects = project_service::list_projects(&state).await?;
    Ok(Json(projects))
}

/// GET /project/{id}
/// Get project by ID
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    tracing::debug!("Getting project: {}", id);

    let project = project_service::get_project(&state, id).await?;
    Ok(Json(project))
}

/// DELETE /project/{id}
/// Launch the destroy run of a project
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    tracing::info!("Deleting project: {}", id);

    let project = project_service::delete_project(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(project)))
}

/// DELETE /project/{id}/purge
/// Remove a destroyed or failed project record
pub async fn purge_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Purging project: {}", id);

    project_service::purge_project(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
