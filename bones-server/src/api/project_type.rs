//! Project Type API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bones_core::domain::project_type::ProjectType;
use bones_core::dto::project_type::CreateProjectType;

use crate::api::error::ApiResult;
use crate::service::AppState;
use crate::service::project_type_service;

/// POST /type
/// Create or update a project type
pub async fn create_project_type(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectType>,
) -> ApiResult<Json<ProjectType>> {
    tracing::info!("Saving project type: {}", req.name);

    let project_type = project_type_service::create_or_update(&state, req).await?;
    Ok(Json(project_type))
}

/// GET /type
pub async fn list_project_types(State(state): State<AppState>) -> ApiResult<Json<Vec<ProjectType>>> {
    let project_types = project_type_service::list_project_types(&state).await?;
    Ok(Json(project_types))
}

/// GET /type/{slug}
pub async fn get_project_type(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProjectType>> {
    let project_type = project_type_service::get_project_type(&state, &slug).await?;
    Ok(Json(project_type))
}

/// DELETE /type/{slug}
pub async fn delete_project_type(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting project type: {}", slug);

    project_type_service::delete_project_type(&state, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
