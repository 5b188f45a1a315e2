//! Source repository handler
//!
//! Creates the project repository through the repository terraform module,
//! then seeds it with the project type's template tree.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{CreateRequest, DestroyRequest, Handler, StepArtifact, required, stage_module, step_dir};
use crate::config::{GithubCredentials, PipelineConfig};
use crate::context::APP_NAME;
use crate::tools::resolve_subpath;
use crate::tools::source::SourceControl;
use crate::tools::template::copy_tree;
use crate::tools::terraform::{InfraTool, StateBackend, Vars};

/// Context key holding the created repository's name
pub const REPO_NAME: &str = "REPO_NAME";

pub struct GithubHandler {
    source: Arc<dyn SourceControl>,
    infra: Arc<dyn InfraTool>,
    config: PipelineConfig,
}

impl GithubHandler {
    pub fn new(
        source: Arc<dyn SourceControl>,
        infra: Arc<dyn InfraTool>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            infra,
            config,
        }
    }

    fn credentials(&self) -> Result<&GithubCredentials> {
        self.config
            .credentials
            .github
            .as_ref()
            .context("GITHUB credentials are not configured")
    }

    fn module_vars(&self, repo_name: &str) -> Result<Vars> {
        let creds = self.credentials()?;
        Ok(Vars::from([
            ("repo_name".to_string(), repo_name.to_string()),
            ("github_user".to_string(), creds.user.clone()),
            ("github_token".to_string(), creds.token.clone()),
        ]))
    }

    /// Remote state for the repository module; staged modules keep no local state
    fn backend(&self, repo_name: &str) -> Result<StateBackend> {
        self.config
            .state_backend(&format!("{}/repo", repo_name))
            .with_context(|| {
                format!(
                    "Remote state is not configured for repository {} (AWS credentials missing)",
                    repo_name
                )
            })
    }
}

#[async_trait]
impl Handler for GithubHandler {
    fn key(&self) -> &'static str {
        "github"
    }

    async fn create(&self, req: CreateRequest<'_>) -> Result<StepArtifact> {
        let repo_name = required(req.data, APP_NAME)?;
        let base = self
            .config
            .credentials
            .github_base
            .as_deref()
            .context("GITHUB_BASE is not configured")?;
        let vars = self.module_vars(repo_name)?;
        let backend = self.backend(repo_name)?;

        info!("Creating repository {} for {}", repo_name, req.project_name);

        let module = stage_module(&self.config.repo_module_dir)?;
        self.infra
            .apply(module.path(), &vars, Some(&backend))
            .await
            .context("Failed to create repository")?;

        let repo_url = format!("{}/{}", base, repo_name);

        let template = self.source.checkout(req.template_source).await?;
        let repo = self.source.checkout(&repo_url).await?;

        let template_dir = resolve_subpath(template.path(), step_dir(req.step, req.template_path))?;
        let copied = copy_tree(&template_dir, repo.path())?;
        info!("Copied {} template files into {}", copied, repo_url);

        self.source.commit_and_push(&repo, "Initial Commit").await?;

        Ok(StepArtifact::repo(repo_url).with_value(REPO_NAME, repo_name))
    }

    async fn destroy(&self, req: DestroyRequest<'_>) -> Result<()> {
        let repo_name = match req.data.get(REPO_NAME) {
            Some(name) => name.as_str(),
            None => required(req.data, APP_NAME)?,
        };
        let vars = self.module_vars(repo_name)?;
        let backend = self.backend(repo_name)?;

        info!("Deleting repository {} for {}", repo_name, req.project_name);

        let module = stage_module(&self.config.repo_module_dir)?;
        self.infra
            .destroy(module.path(), &vars, Some(&backend))
            .await
            .context("Failed to delete repository")?;

        Ok(())
    }
}
