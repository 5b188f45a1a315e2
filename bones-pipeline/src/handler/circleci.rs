//! CI registration handler

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{CreateRequest, DestroyRequest, Handler, StepArtifact, required, step_dir};
use crate::config::PipelineConfig;
use crate::context::APP_NAME;
use crate::tools::resolve_subpath;
use crate::tools::source::SourceControl;
use crate::tools::template::render;
use crate::tools::terraform::{InfraTool, StateBackend, Vars};

const MODULE_DIR: &str = "infra/circleci";
const CONFIG_FILE: &str = "config.yml";

pub struct CircleCiHandler {
    source: Arc<dyn SourceControl>,
    infra: Arc<dyn InfraTool>,
    config: PipelineConfig,
}

impl CircleCiHandler {
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

    fn vars(&self, project_name: &str) -> Result<Vars> {
        let credentials = &self.config.credentials;
        let circleci = credentials
            .circleci
            .as_ref()
            .context("CIRCLECI credentials are not configured")?;
        let github = credentials
            .github
            .as_ref()
            .context("GITHUB credentials are not configured")?;

        Ok(Vars::from([
            ("project_name".to_string(), project_name.to_string()),
            ("github_user".to_string(), github.user.clone()),
            ("circleci_token".to_string(), circleci.token.clone()),
        ]))
    }

    fn backend(&self, app_name: &str, module_dir: &str) -> Result<StateBackend> {
        let prefix = format!("{}/{}", app_name, module_dir.trim_matches('/'));
        self.config.state_backend(&prefix).with_context(|| {
            format!(
                "Remote state is not configured for {} (AWS credentials missing)",
                prefix
            )
        })
    }
}

#[async_trait]
impl Handler for CircleCiHandler {
    fn key(&self) -> &'static str {
        "circleci"
    }

    async fn create(&self, req: CreateRequest<'_>) -> Result<StepArtifact> {
        let app_name = required(req.data, APP_NAME)?;
        let repo_url = req
            .repo_reference
            .context("No project repository to add the CI config to")?;
        let module_dir = step_dir(req.step, MODULE_DIR);
        let vars = self.vars(app_name)?;
        let backend = self.backend(app_name, module_dir)?;

        info!("Creating CircleCI project for {}", req.project_name);

        let template = self.source.checkout(req.template_source).await?;
        let module = resolve_subpath(
            &resolve_subpath(template.path(), req.template_path)?,
            module_dir,
        )?;

        // Rendered before any remote change
        let config_path = module.join(CONFIG_FILE);
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let rendered = render(&raw, req.data).context("Failed to render CI config")?;

        self.infra
            .apply(&module, &vars, Some(&backend))
            .await
            .context("Failed to register CircleCI project")?;

        let repo = self.source.checkout(repo_url).await?;
        let target_dir = repo.path().join(".circleci");
        std::fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;
        std::fs::write(target_dir.join(CONFIG_FILE), rendered)
            .context("Failed to write CI config")?;

        self.source
            .commit_and_push(&repo, "Adding CircleCI Config")
            .await?;

        info!("Finished creating CircleCI project for {}", req.project_name);
        Ok(StepArtifact::default())
    }

    async fn destroy(&self, req: DestroyRequest<'_>) -> Result<()> {
        let app_name = required(req.data, APP_NAME)?;
        let repo_url = req
            .repo_reference
            .context("No project repository holding the CI module")?;
        let module_dir = step_dir(req.step, MODULE_DIR);
        let vars = self.vars(app_name)?;
        let backend = self.backend(app_name, module_dir)?;

        info!("Destroying CircleCI project for {}", req.project_name);

        let repo = self.source.checkout(repo_url).await?;
        let module = resolve_subpath(repo.path(), module_dir)?;
        self.infra
            .destroy(&module, &vars, Some(&backend))
            .await
            .context("Failed to remove CircleCI project")?;

        Ok(())
    }
}
