//! Handler registry
//!
//! Handlers are named capabilities that perform one step against one external
//! system. Manifest steps refer to them by key; the registry is a plain
//! dispatch table from key to implementation.

pub mod aws;
pub mod circleci;
pub mod github;

use anyhow::Context;
use async_trait::async_trait;
use bones_core::domain::manifest::Step;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::tools::source::GitCli;
use crate::tools::template::copy_tree;
use crate::tools::terraform::TerraformCli;

/// Input to a generate step
#[derive(Debug, Clone, Copy)]
pub struct CreateRequest<'a> {
    pub project_name: &'a str,
    /// Repository produced by an earlier step (or a previous run)
    pub repo_reference: Option<&'a str>,
    pub template_source: &'a str,
    pub template_path: &'a str,
    pub step: &'a Step,
    pub data: &'a HashMap<String, String>,
}

/// Input to a destroy step
#[derive(Debug, Clone, Copy)]
pub struct DestroyRequest<'a> {
    pub project_name: &'a str,
    pub repo_reference: Option<&'a str>,
    pub step: &'a Step,
    pub data: &'a HashMap<String, String>,
}

/// What a generate step produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArtifact {
    /// New repository reference for every later step
    pub repo_reference: Option<String>,
    /// Values merged into the pipeline context
    pub values: HashMap<String, String>,
}

impl StepArtifact {
    pub fn repo(reference: impl Into<String>) -> Self {
        Self {
            repo_reference: Some(reference.into()),
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// Trait for step handlers
///
/// Implementations own their retry policy; the executor never retries.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Key manifest steps use to select this handler
    fn key(&self) -> &'static str;

    async fn create(&self, req: CreateRequest<'_>) -> anyhow::Result<StepArtifact>;

    async fn destroy(&self, req: DestroyRequest<'_>) -> anyhow::Result<()>;
}

/// Dispatch table from handler key to implementation
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the `github`, `aws` and `circleci` handlers wired to
    /// the git and terraform command-line tools
    pub fn with_defaults(config: &PipelineConfig) -> Self {
        let credentials = &config.credentials;
        let git = Arc::new(GitCli::new(
            &config.git_bin,
            credentials.github.clone(),
            credentials.github_email.clone(),
        ));
        let terraform = Arc::new(TerraformCli::new(&config.terraform_bin));

        let mut registry = Self::new();
        registry.register(github::GithubHandler::new(
            git.clone(),
            terraform.clone(),
            config.clone(),
        ));
        registry.register(aws::AwsHandler::new(
            git.clone(),
            terraform.clone(),
            config.clone(),
        ));
        registry.register(circleci::CircleCiHandler::new(git, terraform, config.clone()));
        registry
    }

    /// Registers a handler
    ///
    /// # Panics
    /// Panics if a handler with the same key is already registered
    pub fn register<H: Handler + 'static>(&mut self, handler: H) {
        self.register_arc(Arc::new(handler));
    }

    /// Registers a shared handler
    ///
    /// # Panics
    /// Panics if a handler with the same key is already registered
    pub fn register_arc(&mut self, handler: Arc<dyn Handler>) {
        let key = handler.key();
        if self.handlers.contains_key(key) {
            panic!("Handler with key '{}' is already registered", key);
        }
        self.handlers.insert(key, handler);
    }

    /// Looks up a handler by key
    pub fn get(&self, key: &str) -> Result<Arc<dyn Handler>> {
        self.handlers
            .get(key)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownHandler(key.to_string()))
    }

    /// Resolves the handler of every step, failing on the first unknown key
    pub fn resolve(&self, steps: &[Step]) -> Result<Vec<Arc<dyn Handler>>> {
        steps.iter().map(|step| self.get(&step.handler)).collect()
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = self.handlers.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

/// Working subdirectory for a step: the step's own path, or the handler default
pub(crate) fn step_dir<'a>(step: &'a Step, default: &'a str) -> &'a str {
    if step.path.is_empty() {
        default
    } else {
        &step.path
    }
}

/// Copies a terraform module into a run-private directory
///
/// Concurrent runs never share `.terraform` or plan files this way.
pub(crate) fn stage_module(module: &Path) -> anyhow::Result<TempDir> {
    let staged = tempfile::Builder::new()
        .prefix("bones-module-")
        .tempdir()
        .context("Failed to create module directory")?;
    copy_tree(module, staged.path())
        .with_context(|| format!("Failed to stage module {}", module.display()))?;
    Ok(staged)
}

/// Looks up a context value a handler cannot run without
pub(crate) fn required<'a>(data: &'a HashMap<String, String>, key: &str) -> anyhow::Result<&'a str> {
    data.get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Pipeline context has no value for {}", key))
}
