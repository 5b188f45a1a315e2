//! Project registry
//!
//! The authoritative store of projects and project types. It is the only state
//! shared between concurrent pipeline runs and the request path, so every
//! implementation must apply each operation atomically.
//!
//! All registries are trait-based so the server can swap the in-memory store
//! for a persistent one.

mod memory;

pub use memory::InMemoryRegistry;

use async_trait::async_trait;
use bones_core::domain::project::{Project, ProjectStatus, ProjectUpdate, TransitionError};
use bones_core::domain::project_type::ProjectType;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors returned by registry implementations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid transition for project {id}: {source}")]
    Transition {
        id: Uuid,
        #[source]
        source: TransitionError,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    pub fn project_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: "Project",
            key: id.to_string(),
        }
    }

    pub fn project_type_not_found(slug: &str) -> Self {
        Self::NotFound {
            kind: "Project type",
            key: slug.to_string(),
        }
    }
}

/// Registry trait for project and project type records
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    /// Inserts a new project before any pipeline step has run.
    ///
    /// Fails with `NotFound` when the referenced project type does not exist.
    async fn create_placeholder(&self, project: Project) -> Result<Project>;

    async fn get_project(&self, id: Uuid) -> Result<Project>;

    /// Lists projects, newest first
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Applies one pipeline update atomically and returns the updated record
    async fn update_from_pipeline(&self, id: Uuid, update: ProjectUpdate) -> Result<Project>;

    /// Removes a project record and returns it
    async fn remove(&self, id: Uuid) -> Result<Project>;

    /// Inserts or replaces a project type.
    ///
    /// Fails with `Conflict` when an existing type is referenced by a live project.
    async fn upsert_project_type(&self, project_type: ProjectType) -> Result<ProjectType>;

    async fn get_project_type(&self, slug: &str) -> Result<ProjectType>;

    /// Lists project types ordered by slug
    async fn list_project_types(&self) -> Result<Vec<ProjectType>>;

    /// Removes a project type that no live project references
    async fn remove_project_type(&self, slug: &str) -> Result<ProjectType>;
}

/// Whether a project still pins its project type.
///
/// Destroyed tombstones no longer need the template, so they do not block type changes.
pub fn references_type(project: &Project, slug: &str) -> bool {
    project.type_slug == slug && project.status != ProjectStatus::Destroyed
}

/// Applies an update to a record, mapping a rejected transition to a registry error
pub fn apply_update(project: &mut Project, update: ProjectUpdate) -> Result<()> {
    let id = project.id;
    project
        .apply(update)
        .map_err(|source| RegistryError::Transition { id, source })
}
