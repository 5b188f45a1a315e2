//! Application infrastructure handler
//!
//! Renders the template's ECS terraform module with the pipeline context,
//! commits the rendered module into the project repository and applies it
//! against remote state keyed by the application name.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{CreateRequest, DestroyRequest, Handler, StepArtifact, required, step_dir};
use crate::config::{AwsCredentials, PipelineConfig};
use crate::context::APP_NAME;
use crate::tools::resolve_subpath;
use crate::tools::source::SourceControl;
use crate::tools::template::render_tree;
use crate::tools::terraform::{InfraTool, StateBackend, Vars};

/// Default module location, inside both the template and the project repository
const MODULE_DIR: &str = "infra/aws-ecs";

pub struct AwsHandler {
    source: Arc<dyn SourceControl>,
    infra: Arc<dyn InfraTool>,
    config: PipelineConfig,
}

impl AwsHandler {
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

    fn credentials(&self) -> Result<&AwsCredentials> {
        self.config
            .credentials
            .aws
            .as_ref()
            .context("AWS credentials are not configured")
    }

    fn vars(&self) -> Result<Vars> {
        let creds = self.credentials()?;
        Ok(Vars::from([
            ("vpc_id".to_string(), self.config.vpc_id.clone()),
            ("aws_region".to_string(), creds.region.clone()),
            ("aws_access_key".to_string(), creds.access_key.clone()),
            ("aws_secret_key".to_string(), creds.secret_key.clone()),
        ]))
    }

    fn backend(&self, app_name: &str, module_dir: &str) -> Result<StateBackend> {
        self.config
            .state_backend(&format!("{}/{}", app_name, module_dir.trim_matches('/')))
            .context("AWS credentials are not configured")
    }
}

#[async_trait]
impl Handler for AwsHandler {
    fn key(&self) -> &'static str {
        "aws"
    }

    async fn create(&self, req: CreateRequest<'_>) -> Result<StepArtifact> {
        let app_name = required(req.data, APP_NAME)?;
        let repo_url = req
            .repo_reference
            .context("No project repository to commit infrastructure into")?;
        let module_dir = step_dir(req.step, MODULE_DIR);
        let vars = self.vars()?;
        let backend = self.backend(app_name, module_dir)?;

        info!("Creating AWS infrastructure for {}", req.project_name);

        let template = self.source.checkout(req.template_source).await?;
        let template_module = resolve_subpath(
            &resolve_subpath(template.path(), req.template_path)?,
            module_dir,
        )?;

        let repo = self.source.checkout(repo_url).await?;
        let rendered_module = resolve_subpath(repo.path(), module_dir)?;
        render_tree(&template_module, &rendered_module, req.data)
            .context("Failed to render infrastructure module")?;

        self.source
            .commit_and_push(&repo, "Process AWS Terraform file")
            .await?;

        self.infra
            .apply(&rendered_module, &vars, Some(&backend))
            .await
            .context("Failed to create AWS infrastructure")?;

        info!("Finished creating AWS infrastructure for {}", req.project_name);
        Ok(StepArtifact::default())
    }

    async fn destroy(&self, req: DestroyRequest<'_>) -> Result<()> {
        let app_name = required(req.data, APP_NAME)?;
        let repo_url = req
            .repo_reference
            .context("No project repository holding the infrastructure module")?;
        let module_dir = step_dir(req.step, MODULE_DIR);
        let vars = self.vars()?;
        let backend = self.backend(app_name, module_dir)?;

        info!("Destroying AWS infrastructure for {}", req.project_name);

        let repo = self.source.checkout(repo_url).await?;
        let module = resolve_subpath(repo.path(), module_dir)?;
        self.infra
            .destroy(&module, &vars, Some(&backend))
            .await
            .context("Failed to destroy AWS infrastructure")?;

        Ok(())
    }
}
