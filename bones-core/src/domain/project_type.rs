//! Project type domain types

use serde::{Deserialize, Serialize};

/// A template from which projects are instantiated.
///
/// `repo` locates the template source and `path` is the subdirectory inside it
/// that holds the skeleton (and its `.skeleton/skeleton.yaml` manifest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectType {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub repo: String,
    pub path: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
