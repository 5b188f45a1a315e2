//! Project DTOs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::project::Project;

/// Request to create a project from a project type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Slug of the project type to instantiate
    #[serde(rename = "type")]
    pub type_slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl From<CreateProject> for Project {
    fn from(req: CreateProject) -> Self {
        Project::placeholder(req.name, req.type_slug, req.description, req.data)
    }
}
