//! Bones HTTP Client
//!
//! A type-safe HTTP client for the Bones server API, used by the CLI.
//!
//! # Example
//!
//! ```no_run
//! use bones_client::BonesClient;
//! use bones_core::dto::project::CreateProject;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BonesClient::new("http://localhost:8080");
//!
//!     let project = client.create_project(CreateProject {
//!         type_slug: "go-app".to_string(),
//!         name: "My App".to_string(),
//!         description: None,
//!         data: Default::default(),
//!     }).await?;
//!
//!     println!("Provisioning project: {}", project.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod project_types;
mod projects;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Bones server API
///
/// Methods are grouped by resource:
/// - Projects (create, list, get, delete, purge)
/// - Project types (create or update, list, get, delete)
#[derive(Debug, Clone)]
pub struct BonesClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

impl BonesClient {
    /// Create a new client for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server is up
    pub async fn health(&self) -> Result<String> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::api_error(status.as_u16(), body));
        }

        Ok(body)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!("Request failed with status {}: {}", status, error_text);
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!("Request failed with status {}: {}", status, error_text);
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
