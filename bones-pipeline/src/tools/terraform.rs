//! Infrastructure-as-code collaborator
//!
//! Runs terraform against a module directory. Plan/apply semantics belong to
//! terraform itself; this wrapper only sequences the commands.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

use super::run_command;

/// Remote state location for a module
#[derive(Clone, PartialEq, Eq)]
pub struct StateBackend {
    pub bucket: String,
    pub region: String,
    pub key: String,
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for StateBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateBackend")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Variables passed to a module as `-var key=value`
pub type Vars = BTreeMap<String, String>;

/// Infrastructure tool trait
#[async_trait]
pub trait InfraTool: Send + Sync {
    /// Creates or updates the resources described by the module in `dir`
    async fn apply(&self, dir: &Path, vars: &Vars, backend: Option<&StateBackend>) -> Result<()>;

    /// Destroys the resources tracked for the module in `dir`
    async fn destroy(&self, dir: &Path, vars: &Vars, backend: Option<&StateBackend>)
    -> Result<()>;
}

/// Terraform command-line implementation
pub struct TerraformCli {
    bin: PathBuf,
}

impl TerraformCli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.current_dir(dir).env("TF_IN_AUTOMATION", "1");
        cmd
    }

    async fn init(&self, dir: &Path, backend: Option<&StateBackend>) -> Result<()> {
        let mut cmd = self.command(dir);
        cmd.arg("init").arg("-input=false");
        let mut secrets = Vec::new();

        if let Some(backend) = backend {
            for (key, value) in backend_config(backend) {
                cmd.arg(format!("-backend-config={}={}", key, value));
            }
            secrets.push(backend.access_key.as_str());
            secrets.push(backend.secret_key.as_str());
        }

        run_command(cmd, &secrets)
            .await
            .context("terraform init failed")?;
        Ok(())
    }

    fn with_vars(cmd: &mut Command, vars: &Vars) {
        for (key, value) in vars {
            cmd.arg("-var").arg(format!("{}={}", key, value));
        }
    }
}

fn backend_config(backend: &StateBackend) -> Vec<(&'static str, String)> {
    vec![
        ("bucket", backend.bucket.clone()),
        ("key", backend.key.clone()),
        ("region", backend.region.clone()),
        ("encrypt", "true".to_string()),
        ("access_key", backend.access_key.clone()),
        ("secret_key", backend.secret_key.clone()),
    ]
}

fn secret_values(vars: &Vars) -> Vec<&str> {
    vars.iter()
        .filter(|(k, _)| k.contains("token") || k.contains("secret") || k.contains("key"))
        .map(|(_, v)| v.as_str())
        .collect()
}

#[async_trait]
impl InfraTool for TerraformCli {
    async fn apply(&self, dir: &Path, vars: &Vars, backend: Option<&StateBackend>) -> Result<()> {
        info!("Applying terraform module at {}", dir.display());
        self.init(dir, backend).await?;

        let secrets = secret_values(vars);

        let mut plan = self.command(dir);
        plan.arg("plan").arg("-input=false").arg("-out=tfplan");
        Self::with_vars(&mut plan, vars);
        run_command(plan, &secrets)
            .await
            .context("terraform plan failed")?;

        let mut apply = self.command(dir);
        apply.arg("apply").arg("-input=false").arg("tfplan");
        run_command(apply, &secrets)
            .await
            .context("terraform apply failed")?;

        Ok(())
    }

    async fn destroy(
        &self,
        dir: &Path,
        vars: &Vars,
        backend: Option<&StateBackend>,
    ) -> Result<()> {
        info!("Destroying terraform module at {}", dir.display());
        self.init(dir, backend).await?;

        let mut cmd = self.command(dir);
        cmd.arg("destroy").arg("-input=false").arg("-auto-approve");
        Self::with_vars(&mut cmd, vars);
        run_command(cmd, &secret_values(vars))
            .await
            .context("terraform destroy failed")?;

        Ok(())
    }
}
