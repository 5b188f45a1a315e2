//! Project Service
//!
//! Business logic for the project lifecycle. Creating or deleting a project
//! only validates the request and records its intent; the pipeline run itself
//! happens in a tracked background task and reports through the registry.

use bones_core::domain::project::{Project, ProjectStatus, ProjectUpdate};
use bones_core::dto::project::CreateProject;
use bones_core::slugify;
use bones_pipeline::RegistryError;
use uuid::Uuid;

use super::AppState;

/// Service error type
#[derive(Debug)]
pub enum ProjectError {
    NotFound(Uuid),
    TypeNotFound(String),
    ValidationError(String),
    Conflict(String),
    Registry(RegistryError),
}

impl From<RegistryError> for ProjectError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Conflict(msg) => ProjectError::Conflict(msg),
            err @ RegistryError::Transition { .. } => ProjectError::Conflict(err.to_string()),
            err => ProjectError::Registry(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectError>;

/// Create a project and launch its generate run
///
/// Returns the `Pending` placeholder; progress is visible through [`get_project`].
pub async fn create_project(state: &AppState, req: CreateProject) -> Result<Project> {
    validate_project_request(&req)?;

    let project_type = state
        .registry
        .get_project_type(&req.type_slug)
        .await
        .map_err(|e| match e {
            RegistryError::NotFound { .. } => ProjectError::TypeNotFound(req.type_slug.clone()),
            other => other.into(),
        })?;

    // Live projects share the app slug namespace (repository and state keys)
    let app_name = slugify(&req.name);
    let taken = state
        .registry
        .list_projects()
        .await?
        .into_iter()
        .any(|p| p.status != ProjectStatus::Destroyed && slugify(&p.name) == app_name);
    if taken {
        return Err(ProjectError::Conflict(format!(
            "A project named '{}' already exists",
            app_name
        )));
    }

    let project = state.registry.create_placeholder(req.into()).await?;
    tracing::info!(
        "Project created: {} ({}) from type {}",
        project.name,
        project.id,
        project_type.slug
    );

    let executor = state.executor.clone();
    let placeholder = project.clone();
    state
        .tracker
        .spawn(project.id, async move {
            if let Err(e) = executor.run_generate(&placeholder, &project_type).await {
                tracing::debug!("Generate run for project {} ended with: {}", placeholder.id, e);
            }
        })
        .map_err(|e| ProjectError::Conflict(e.to_string()))?;

    Ok(project)
}

/// Get a project by ID
pub async fn get_project(state: &AppState, id: Uuid) -> Result<Project> {
    state.registry.get_project(id).await.map_err(|e| match e {
        RegistryError::NotFound { .. } => ProjectError::NotFound(id),
        other => other.into(),
    })
}

/// List all projects, newest first
pub async fn list_projects(state: &AppState) -> Result<Vec<Project>> {
    let projects = state.registry.list_projects().await?;
    Ok(projects)
}

/// Launch the destroy run of a project
///
/// The record stays as a `Destroyed` tombstone unless tombstones are disabled,
/// in which case it is removed once the run succeeds.
pub async fn delete_project(state: &AppState, id: Uuid) -> Result<Project> {
    let project = get_project(state, id).await?;

    match project.status {
        ProjectStatus::Destroyed => {
            return Err(ProjectError::Conflict(format!(
                "Project {} has already been destroyed",
                id
            )));
        }
        ProjectStatus::Running => {
            return Err(ProjectError::Conflict(format!(
                "Project {} has a pipeline run in progress",
                id
            )));
        }
        _ => {}
    }

    let executor = state.executor.clone();
    let retain_tombstones = state.retain_tombstones;
    let target = project.clone();
    state
        .tracker
        .spawn(id, async move {
            match executor.run_destroy(&target).await {
                Ok(_) if !retain_tombstones => match executor.registry().remove(target.id).await {
                    Ok(_) => tracing::info!("Project {} purged after destroy", target.id),
                    Err(e) => tracing::error!("Failed to purge project {}: {}", target.id, e),
                },
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Destroy run for project {} ended with: {}", target.id, e);
                }
            }
        })
        .map_err(|e| ProjectError::Conflict(e.to_string()))?;

    tracing::info!("Destroy launched for project {} ({})", project.name, id);

    Ok(project)
}

/// Remove a `Destroyed` or `Failed` project record
pub async fn purge_project(state: &AppState, id: Uuid) -> Result<Project> {
    let project = get_project(state, id).await?;

    if state.tracker.is_active(id) {
        return Err(ProjectError::Conflict(format!(
            "Project {} has a pipeline run in progress",
            id
        )));
    }

    if !matches!(
        project.status,
        ProjectStatus::Destroyed | ProjectStatus::Failed
    ) {
        return Err(ProjectError::Conflict(format!(
            "Project {} is {}; only Destroyed or Failed projects can be purged",
            id, project.status
        )));
    }

    let removed = state.registry.remove(id).await?;
    tracing::info!("Project purged: {} ({})", removed.name, id);

    Ok(removed)
}

/// Fail every project left `Running` by a previous server process
///
/// Runs are in-process tasks, so nothing can still be driving them.
pub async fn recover_interrupted_runs(state: &AppState) -> Result<usize> {
    let mut recovered = 0;

    for project in state.registry.list_projects().await? {
        if project.status != ProjectStatus::Running || state.tracker.is_active(project.id) {
            continue;
        }

        state
            .registry
            .update_from_pipeline(
                project.id,
                ProjectUpdate::RunFailed {
                    failed_step: None,
                    error: "Run interrupted by a server restart".to_string(),
                },
            )
            .await?;
        tracing::warn!("Marked interrupted project {} as failed", project.id);
        recovered += 1;
    }

    Ok(recovered)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_project_request(req: &CreateProject) -> Result<()> {
    validate_name("Project", &req.name).map_err(ProjectError::ValidationError)?;

    if req.type_slug.trim().is_empty() {
        return Err(ProjectError::ValidationError(
            "Project type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks a display name that will be slugified into resource names
pub(crate) fn validate_name(kind: &str, name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{} name cannot be empty", kind));
    }

    if name.len() > 255 {
        return Err(format!("{} name is too long (max 255 characters)", kind));
    }

    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(format!("{} name must start with a letter or digit", kind));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_')))
    {
        return Err(format!("{} name contains invalid character '{}'", kind, c));
    }

    Ok(())
}
