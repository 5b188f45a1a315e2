//! Project Repository
//!
//! Handles all database operations related to projects.

use bones_core::domain::project::{PipelineRun, Project, ProjectStatus};
use sqlx::PgExecutor;
use sqlx::types::Json;
use uuid::Uuid;

const COLUMNS: &str = "id, name, type_slug, description, repo, data, status, last_run, created_at, updated_at";

/// Insert a new project
pub async fn insert<'e>(executor: impl PgExecutor<'e>, project: &Project) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO projects (
            id, name, type_slug, description, repo, data, status, last_run, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(project.id)
    .bind(&project.name)
    .bind(&project.type_slug)
    .bind(&project.description)
    .bind(&project.repo)
    .bind(Json(&project.data))
    .bind(project.status.as_str())
    .bind(project.last_run.as_ref().map(Json))
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Find a project by ID
pub async fn find_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {} FROM projects WHERE id = $1",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find a project by ID and lock its row until the transaction ends
pub async fn find_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {} FROM projects WHERE id = $1 FOR UPDATE",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List all projects, newest first
pub async fn list_all<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Project>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {} FROM projects ORDER BY created_at DESC",
        COLUMNS
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Write back every mutable column of a project
pub async fn update<'e>(executor: impl PgExecutor<'e>, project: &Project) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE projects
        SET repo = $1, data = $2, status = $3, last_run = $4, updated_at = $5
        WHERE id = $6
        "#,
    )
    .bind(&project.repo)
    .bind(Json(&project.data))
    .bind(project.status.as_str())
    .bind(project.last_run.as_ref().map(Json))
    .bind(project.updated_at)
    .bind(project.id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a project, returning the removed record
pub async fn delete<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "DELETE FROM projects WHERE id = $1 RETURNING {}",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Whether any project that is not a tombstone uses the project type
pub async fn type_is_referenced<'e>(
    executor: impl PgExecutor<'e>,
    type_slug: &str,
) -> Result<bool, sqlx::Error> {
    let referenced: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM projects WHERE type_slug = $1 AND status <> $2)",
    )
    .bind(type_slug)
    .bind(ProjectStatus::Destroyed.as_str())
    .fetch_one(executor)
    .await?;

    Ok(referenced)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    type_slug: String,
    description: Option<String>,
    repo: Option<String>,
    data: serde_json::Value,
    status: String,
    last_run: Option<serde_json::Value>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        let status = ProjectStatus::parse(&row.status).unwrap_or_else(|| {
            tracing::warn!("Project {} has unknown status '{}'", row.id, row.status);
            ProjectStatus::Failed
        });
        let data = serde_json::from_value(row.data).unwrap_or_default();
        let last_run = row
            .last_run
            .and_then(|v| serde_json::from_value::<PipelineRun>(v).ok());

        Project {
            id: row.id,
            name: row.name,
            type_slug: row.type_slug,
            description: row.description,
            repo: row.repo,
            data,
            status,
            last_run,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
