//! Source control collaborator
//!
//! Materializes repositories into scoped temporary checkouts and pushes
//! changes back. A [`Checkout`] owns its directory and removes it on drop.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

use super::run_command;
use crate::config::GithubCredentials;

/// A repository materialized on local disk
pub struct Checkout {
    dir: TempDir,
    locator: String,
}

impl Checkout {
    /// Wraps an already populated directory
    pub fn new(dir: TempDir, locator: impl Into<String>) -> Self {
        Self {
            dir,
            locator: locator.into(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Repository the checkout was taken from
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("path", &self.dir.path())
            .field("locator", &self.locator)
            .finish()
    }
}

/// Source control trait
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Clones `locator` into a fresh temporary directory
    async fn checkout(&self, locator: &str) -> Result<Checkout>;

    /// Commits every change in the checkout and pushes it
    ///
    /// Returns `false` when there was nothing to commit.
    async fn commit_and_push(&self, checkout: &Checkout, message: &str) -> Result<bool>;
}

/// Git command-line implementation
pub struct GitCli {
    bin: PathBuf,
    credentials: Option<GithubCredentials>,
    email: Option<String>,
}

impl GitCli {
    pub fn new(
        bin: impl Into<PathBuf>,
        credentials: Option<GithubCredentials>,
        email: Option<String>,
    ) -> Self {
        Self {
            bin: bin.into(),
            credentials,
            email,
        }
    }

    fn command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.current_dir(dir).env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    fn secrets(&self) -> Vec<&str> {
        self.credentials
            .as_ref()
            .map(|c| vec![c.token.as_str()])
            .unwrap_or_default()
    }

    /// Injects credentials into https locators; other locators are used as-is
    fn authenticated_url(&self, locator: &str) -> String {
        match (&self.credentials, locator.strip_prefix("https://")) {
            (Some(creds), Some(rest)) if !creds.token.is_empty() => {
                let user = if creds.user.is_empty() {
                    "x-access-token"
                } else {
                    creds.user.as_str()
                };
                format!("https://{}:{}@{}", user, creds.token, rest)
            }
            _ => locator.to_string(),
        }
    }

    fn author(&self) -> (String, String) {
        let name = self
            .credentials
            .as_ref()
            .map(|c| c.user.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "bones".to_string());
        let email = self
            .email
            .clone()
            .unwrap_or_else(|| "bones@localhost".to_string());
        (name, email)
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn checkout(&self, locator: &str) -> Result<Checkout> {
        let dir = tempfile::Builder::new()
            .prefix("bones-checkout-")
            .tempdir()
            .context("Failed to create checkout directory")?;

        debug!("Cloning {} into {}", locator, dir.path().display());

        let mut cmd = self.command(dir.path());
        cmd.arg("clone")
            .arg("--depth")
            .arg("1")
            .arg(self.authenticated_url(locator))
            .arg(".");
        run_command(cmd, &self.secrets())
            .await
            .with_context(|| format!("Failed to clone {}", locator))?;

        Ok(Checkout::new(dir, locator))
    }

    async fn commit_and_push(&self, checkout: &Checkout, message: &str) -> Result<bool> {
        let dir = checkout.path();
        let secrets = self.secrets();

        let mut add = self.command(dir);
        add.arg("add").arg("-A");
        run_command(add, &secrets).await.context("git add failed")?;

        let mut status = self.command(dir);
        status.arg("status").arg("--porcelain");
        let pending = run_command(status, &secrets)
            .await
            .context("git status failed")?;
        if pending.trim().is_empty() {
            debug!("Nothing to commit in {}", checkout.locator());
            return Ok(false);
        }

        let (name, email) = self.author();
        let mut commit = self.command(dir);
        commit
            .arg("-c")
            .arg(format!("user.name={}", name))
            .arg("-c")
            .arg(format!("user.email={}", email))
            .arg("commit")
            .arg("-m")
            .arg(message);
        run_command(commit, &secrets)
            .await
            .context("git commit failed")?;

        let mut push = self.command(dir);
        push.arg("push").arg("origin").arg("HEAD");
        run_command(push, &secrets)
            .await
            .with_context(|| format!("Failed to push to {}", checkout.locator()))?;

        info!("Pushed '{}' to {}", message, checkout.locator());
        Ok(true)
    }
}
