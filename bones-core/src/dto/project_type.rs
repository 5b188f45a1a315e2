//! Project type DTOs

use serde::{Deserialize, Serialize};

use crate::domain::project_type::ProjectType;
use crate::slugify;

/// Request to create (or replace) a project type
///
/// The slug is derived from `name`, so posting the same name twice updates the
/// existing type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectType {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Template source locator (e.g. a git URL)
    pub repo: String,
    /// Subdirectory of the template source holding the skeleton
    #[serde(default)]
    pub path: String,
}

impl From<CreateProjectType> for ProjectType {
    fn from(req: CreateProjectType) -> Self {
        let now = chrono::Utc::now();
        Self {
            slug: slugify(&req.name),
            name: req.name,
            description: req.description,
            repo: req.repo,
            path: req.path,
            created_at: now,
            updated_at: now,
        }
    }
}
