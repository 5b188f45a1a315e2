//! Repository Module
//!
//! Postgres data access for the server.
//! Each repository handles database operations for a specific domain entity;
//! [`PgRegistry`] composes them into a [`ProjectRegistry`].

pub mod project;
pub mod project_type;

// Re-export for convenience
pub use project as project_repository;
pub use project_type as project_type_repository;

use async_trait::async_trait;
use bones_core::domain::project::{Project, ProjectUpdate};
use bones_core::domain::project_type::ProjectType;
use bones_pipeline::registry::{ProjectRegistry, RegistryError, Result, apply_update};
use sqlx::PgPool;
use uuid::Uuid;

/// Registry backed by Postgres
///
/// Checks that span both tables run inside one transaction with the type row locked.
#[derive(Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(err: sqlx::Error) -> RegistryError {
    RegistryError::Storage(err.to_string())
}

#[async_trait]
impl ProjectRegistry for PgRegistry {
    async fn create_placeholder(&self, project: Project) -> Result<Project> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        if !project_type_repository::lock(&mut *tx, &project.type_slug, false)
            .await
            .map_err(storage)?
        {
            return Err(RegistryError::project_type_not_found(&project.type_slug));
        }

        project_repository::insert(&mut *tx, &project)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RegistryError::Conflict(format!("Project {} already exists", project.id))
                }
                other => storage(other),
            })?;

        tx.commit().await.map_err(storage)?;
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> Result<Project> {
        project_repository::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .ok_or_else(|| RegistryError::project_not_found(id))
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        project_repository::list_all(&self.pool)
            .await
            .map_err(storage)
    }

    async fn update_from_pipeline(&self, id: Uuid, update: ProjectUpdate) -> Result<Project> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let mut project = project_repository::find_for_update(&mut *tx, id)
            .await
            .map_err(storage)?
            .ok_or_else(|| RegistryError::project_not_found(id))?;

        apply_update(&mut project, update)?;

        project_repository::update(&mut *tx, &project)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;

        Ok(project)
    }

    async fn remove(&self, id: Uuid) -> Result<Project> {
        project_repository::delete(&self.pool, id)
            .await
            .map_err(storage)?
            .ok_or_else(|| RegistryError::project_not_found(id))
    }

    async fn upsert_project_type(&self, project_type: ProjectType) -> Result<ProjectType> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let exists = project_type_repository::lock(&mut *tx, &project_type.slug, true)
            .await
            .map_err(storage)?;

        if exists
            && project_repository::type_is_referenced(&mut *tx, &project_type.slug)
                .await
                .map_err(storage)?
        {
            return Err(RegistryError::Conflict(format!(
                "Project type '{}' is referenced by existing projects",
                project_type.slug
            )));
        }

        let stored = project_type_repository::upsert(&mut *tx, &project_type)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;

        Ok(stored)
    }

    async fn get_project_type(&self, slug: &str) -> Result<ProjectType> {
        project_type_repository::find_by_slug(&self.pool, slug)
            .await
            .map_err(storage)?
            .ok_or_else(|| RegistryError::project_type_not_found(slug))
    }

    async fn list_project_types(&self) -> Result<Vec<ProjectType>> {
        project_type_repository::list_all(&self.pool)
            .await
            .map_err(storage)
    }

    async fn remove_project_type(&self, slug: &str) -> Result<ProjectType> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        if !project_type_repository::lock(&mut *tx, slug, true)
            .await
            .map_err(storage)?
        {
            return Err(RegistryError::project_type_not_found(slug));
        }

        if project_repository::type_is_referenced(&mut *tx, slug)
            .await
            .map_err(storage)?
        {
            return Err(RegistryError::Conflict(format!(
                "Project type '{}' is referenced by existing projects",
                slug
            )));
        }

        let removed = project_type_repository::delete(&mut *tx, slug)
            .await
            .map_err(storage)?
            .ok_or_else(|| RegistryError::project_type_not_found(slug))?;
        tx.commit().await.map_err(storage)?;

        Ok(removed)
    }
}
