//! ID resolver module
//!
//! Resolves UUID prefixes to full project IDs by listing projects from the
//! server, so users can type short, unambiguous prefixes.

use anyhow::{Context, Result, anyhow};
use bones_client::BonesClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a project ID or prefix to a full UUID
///
/// Full UUIDs are returned as-is without contacting the server.
pub async fn resolve_project_id(client: &BonesClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    let prefix = match id_or_prefix {
        IdOrPrefix::Full(uuid) => return Ok(*uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let projects = client
        .list_projects()
        .await
        .context("Failed to fetch projects for ID resolution")?;

    match_prefix(projects.iter().map(|p| p.id), prefix)
}

fn match_prefix(ids: impl Iterator<Item = Uuid>, prefix: &str) -> Result<Uuid> {
    if prefix.is_empty() {
        return Err(anyhow!("Project ID cannot be empty"));
    }

    let matches: Vec<Uuid> = ids
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No project found with ID starting with '{}'", prefix)),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple projects: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
