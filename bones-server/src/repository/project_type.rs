//! Project Type Repository
//!
//! Handles all database operations related to project types.

use bones_core::domain::project_type::ProjectType;
use sqlx::PgExecutor;

/// Insert a project type, or replace every field but `created_at` of an existing one
pub async fn upsert<'e>(
    executor: impl PgExecutor<'e>,
    project_type: &ProjectType,
) -> Result<ProjectType, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectTypeRow>(
        r#"
        INSERT INTO project_types (slug, name, description, repo, path, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (slug) DO UPDATE
        SET name = EXCLUDED.name, description = EXCLUDED.description, repo = EXCLUDED.repo,
            path = EXCLUDED.path, updated_at = EXCLUDED.updated_at
        RETURNING slug, name, description, repo, path, created_at, updated_at
        "#,
    )
    .bind(&project_type.slug)
    .bind(&project_type.name)
    .bind(&project_type.description)
    .bind(&project_type.repo)
    .bind(&project_type.path)
    .bind(project_type.created_at)
    .bind(project_type.updated_at)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Find a project type by slug
pub async fn find_by_slug<'e>(
    executor: impl PgExecutor<'e>,
    slug: &str,
) -> Result<Option<ProjectType>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectTypeRow>(
        r#"
        SELECT slug, name, description, repo, path, created_at, updated_at
        FROM project_types
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Lock a project type row, blocking writers (`exclusive`) or only deleters
///
/// Returns whether the row exists.
pub async fn lock<'e>(
    executor: impl PgExecutor<'e>,
    slug: &str,
    exclusive: bool,
) -> Result<bool, sqlx::Error> {
    let mode = if exclusive { "FOR UPDATE" } else { "FOR SHARE" };
    let found = sqlx::query(&format!(
        "SELECT slug FROM project_types WHERE slug = $1 {}",
        mode
    ))
    .bind(slug)
    .fetch_optional(executor)
    .await?;

    Ok(found.is_some())
}

/// List all project types ordered by slug
pub async fn list_all<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<ProjectType>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProjectTypeRow>(
        r#"
        SELECT slug, name, description, repo, path, created_at, updated_at
        FROM project_types
        ORDER BY slug
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Delete a project type, returning the removed record
pub async fn delete<'e>(
    executor: impl PgExecutor<'e>,
    slug: &str,
) -> Result<Option<ProjectType>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectTypeRow>(
        r#"
        DELETE FROM project_types
        WHERE slug = $1
        RETURNING slug, name, description, repo, path, created_at, updated_at
        "#,
    )
    .bind(slug)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProjectTypeRow {
    slug: String,
    name: String,
    description: Option<String>,
    repo: String,
    path: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProjectTypeRow> for ProjectType {
    fn from(row: ProjectTypeRow) -> Self {
        ProjectType {
            slug: row.slug,
            name: row.name,
            description: row.description,
            repo: row.repo,
            path: row.path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
