//! In-memory registry
//!
//! Both maps sit behind one `RwLock` so cross-map checks (type exists, type is
//! referenced) are atomic with the write they guard. No lock is ever held
//! across an await point outside this module.

use async_trait::async_trait;
use bones_core::domain::project::{Project, ProjectUpdate};
use bones_core::domain::project_type::ProjectType;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectRegistry, RegistryError, Result, apply_update, references_type};

#[derive(Default)]
struct Inner {
    projects: HashMap<Uuid, Project>,
    project_types: HashMap<String, ProjectType>,
}

/// Mutex-guarded registry used when no database is configured
#[derive(Default)]
pub struct InMemoryRegistry {
    inner: RwLock<Inner>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRegistry for InMemoryRegistry {
    async fn create_placeholder(&self, project: Project) -> Result<Project> {
        let mut inner = self.inner.write().await;

        if !inner.project_types.contains_key(&project.type_slug) {
            return Err(RegistryError::project_type_not_found(&project.type_slug));
        }
        if inner.projects.contains_key(&project.id) {
            return Err(RegistryError::Conflict(format!(
                "Project {} already exists",
                project.id
            )));
        }

        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> Result<Project> {
        let inner = self.inner.read().await;
        inner
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::project_not_found(id))
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner.projects.values().cloned().collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn update_from_pipeline(&self, id: Uuid, update: ProjectUpdate) -> Result<Project> {
        let mut inner = self.inner.write().await;
        let project = inner
            .projects
            .get_mut(&id)
            .ok_or_else(|| RegistryError::project_not_found(id))?;

        apply_update(project, update)?;
        Ok(project.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<Project> {
        let mut inner = self.inner.write().await;
        inner
            .projects
            .remove(&id)
            .ok_or_else(|| RegistryError::project_not_found(id))
    }

    async fn upsert_project_type(&self, mut project_type: ProjectType) -> Result<ProjectType> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.project_types.get(&project_type.slug) {
            if inner
                .projects
                .values()
                .any(|p| references_type(p, &project_type.slug))
            {
                return Err(RegistryError::Conflict(format!(
                    "Project type '{}' is referenced by existing projects",
                    project_type.slug
                )));
            }
            project_type.created_at = existing.created_at;
        }

        inner
            .project_types
            .insert(project_type.slug.clone(), project_type.clone());
        Ok(project_type)
    }

    async fn get_project_type(&self, slug: &str) -> Result<ProjectType> {
        let inner = self.inner.read().await;
        inner
            .project_types
            .get(slug)
            .cloned()
            .ok_or_else(|| RegistryError::project_type_not_found(slug))
    }

    async fn list_project_types(&self) -> Result<Vec<ProjectType>> {
        let inner = self.inner.read().await;
        let mut types: Vec<ProjectType> = inner.project_types.values().cloned().collect();
        types.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(types)
    }

    async fn remove_project_type(&self, slug: &str) -> Result<ProjectType> {
        let mut inner = self.inner.write().await;

        if inner.projects.values().any(|p| references_type(p, slug)) {
            return Err(RegistryError::Conflict(format!(
                "Project type '{}' is referenced by existing projects",
                slug
            )));
        }

        inner
            .project_types
            .remove(slug)
            .ok_or_else(|| RegistryError::project_type_not_found(slug))
    }
}
