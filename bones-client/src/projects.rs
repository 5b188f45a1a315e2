//! Project-related API endpoints

use crate::BonesClient;
use crate::error::Result;
use bones_core::domain::project::Project;
use bones_core::dto::project::CreateProject;
use uuid::Uuid;

impl BonesClient {
    // =============================================================================
    // Project Lifecycle
    // =============================================================================

    /// Create a project and launch its generate run
    ///
    /// Returns the `Pending` placeholder; poll [`BonesClient::get_project`] for progress.
    pub async fn create_project(&self, req: CreateProject) -> Result<Project> {
        let url = format!("{}/project", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// List all projects, newest first
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let url = format!("{}/project", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get a project by ID
    pub async fn get_project(&self, project_id: Uuid) -> Result<Project> {
        let url = format!("{}/project/{}", self.base_url, project_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Launch the destroy run of a project
    ///
    /// Returns the project as it was when the run was launched.
    pub async fn delete_project(&self, project_id: Uuid) -> Result<Project> {
        let url = format!("{}/project/{}", self.base_url, project_id);
        let response = self.client.delete(&url).send().await?;

        self.handle_response(response).await
    }

    /// Remove a destroyed or failed project record
    pub async fn purge_project(&self, project_id: Uuid) -> Result<()> {
        let url = format!("{}/project/{}/purge", self.base_url, project_id);
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
