//! Project Type Service
//!
//! Business logic for project type management.

use bones_core::domain::project_type::ProjectType;
use bones_core::dto::project_type::CreateProjectType;
use bones_pipeline::RegistryError;
use std::path::{Component, Path};

use super::AppState;
use super::project::validate_name;

/// Service error type
#[derive(Debug)]
pub enum ProjectTypeError {
    NotFound(String),
    ValidationError(String),
    Conflict(String),
    Registry(RegistryError),
}

impl From<RegistryError> for ProjectTypeError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { key, .. } => ProjectTypeError::NotFound(key),
            RegistryError::Conflict(msg) => ProjectTypeError::Conflict(msg),
            other => ProjectTypeError::Registry(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectTypeError>;

/// Create a project type, or replace the one with the same slug
pub async fn create_or_update(state: &AppState, req: CreateProjectType) -> Result<ProjectType> {
    validate_project_type_request(&req)?;

    let project_type = state.registry.upsert_project_type(req.into()).await?;

    tracing::info!(
        "Project type saved: {} ({})",
        project_type.name,
        project_type.slug
    );

    Ok(project_type)
}

/// Get a project type by slug
pub async fn get_project_type(state: &AppState, slug: &str) -> Result<ProjectType> {
    let project_type = state.registry.get_project_type(slug).await?;
    Ok(project_type)
}

/// List all project types
pub async fn list_project_types(state: &AppState) -> Result<Vec<ProjectType>> {
    let project_types = state.registry.list_project_types().await?;
    Ok(project_types)
}

/// Delete a project type no live project uses
pub async fn delete_project_type(state: &AppState, slug: &str) -> Result<ProjectType> {
    let removed = state.registry.remove_project_type(slug).await?;

    tracing::info!("Project type deleted: {}", slug);

    Ok(removed)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_project_type_request(req: &CreateProjectType) -> Result<()> {
    validate_name("Project type", &req.name).map_err(ProjectTypeError::ValidationError)?;

    if req.repo.trim().is_empty() {
        return Err(ProjectTypeError::ValidationError(
            "Project type repo cannot be empty".to_string(),
        ));
    }

    if Path::new(&req.path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ProjectTypeError::ValidationError(format!(
            "Project type path '{}' must stay inside the repository",
            req.path
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::project_service;
    use crate::testing::{ECHO_MANIFEST, app_state, go_type};
    use bones_core::dto::project::CreateProject;
    use std::collections::HashMap;

    #[test]
    fn test_validate_request() {
        assert!(validate_project_type_request(&go_type()).is_ok());

        let mut req = go_type();
        req.repo = " ".to_string();
        assert!(validate_project_type_request(&req).is_err());

        let mut req = go_type();
        req.path = "go/../../etc".to_string();
        assert!(validate_project_type_request(&req).is_err());

        let mut req = go_type();
        req.name = String::new();
        assert!(validate_project_type_request(&req).is_err());
    }

    #[tokio::test]
    async fn test_create_then_update_keeps_slug() {
        let state = app_state(ECHO_MANIFEST, true);

        let created = create_or_update(&state, go_type()).await.unwrap();
        assert_eq!(created.slug, "go-app");

        let mut req = go_type();
        req.path = "golang".to_string();
        let updated = create_or_update(&state, req).await.unwrap();

        assert_eq!(updated.slug, "go-app");
        assert_eq!(updated.path, "golang");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(list_project_types(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_and_delete_missing() {
        let state = app_state(ECHO_MANIFEST, true);

        assert!(matches!(
            get_project_type(&state, "nope").await,
            Err(ProjectTypeError::NotFound(slug)) if slug == "nope"
        ));
        assert!(matches!(
            delete_project_type(&state, "nope").await,
            Err(ProjectTypeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_referenced_type_is_immutable() {
        let state = app_state(ECHO_MANIFEST, true);
        create_or_update(&state, go_type()).await.unwrap();

        let project = project_service::create_project(
            &state,
            CreateProject {
                type_slug: "go-app".to_string(),
                name: "my app".to_string(),
                description: None,
                data: HashMap::new(),
            },
        )
        .await
        .unwrap();
        state.tracker.wait_idle().await;

        assert!(matches!(
            create_or_update(&state, go_type()).await,
            Err(ProjectTypeError::Conflict(_))
        ));
        assert!(matches!(
            delete_project_type(&state, "go-app").await,
            Err(ProjectTypeError::Conflict(_))
        ));

        project_service::delete_project(&state, project.id)
            .await
            .unwrap();
        state.tracker.wait_idle().await;

        assert!(delete_project_type(&state, "go-app").await.is_ok());
    }
}
