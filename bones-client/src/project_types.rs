//! Project type API endpoints

use crate::BonesClient;
use crate::error::Result;
use bones_core::domain::project_type::ProjectType;
use bones_core::dto::project_type::CreateProjectType;

impl BonesClient {
    // =============================================================================
    // Project Type Management
    // =============================================================================

    /// Create a project type, or update the one whose name slugifies the same
    pub async fn save_project_type(&self, req: CreateProjectType) -> Result<ProjectType> {
        let url = format!("{}/type", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    pub async fn list_project_types(&self) -> Result<Vec<ProjectType>> {
        let url = format!("{}/type", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    pub async fn get_project_type(&self, slug: &str) -> Result<ProjectType> {
        let url = format!("{}/type/{}", self.base_url, slug);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    pub async fn delete_project_type(&self, slug: &str) -> Result<()> {
        let url = format!("{}/type/{}", self.base_url, slug);
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
