//! Test doubles for the pipeline collaborators and handlers

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::{
    AwsCredentials, CircleCiCredentials, Credentials, GithubCredentials, PipelineConfig,
};
use crate::handler::{CreateRequest, DestroyRequest, Handler, StepArtifact};
use crate::tools::source::{Checkout, SourceControl};
use crate::tools::template::copy_tree;
use crate::tools::terraform::{InfraTool, StateBackend, Vars};

/// Pipeline config with every credential set and a one-file repository module
pub struct TestConfig {
    pub config: PipelineConfig,
    _module: TempDir,
}

pub fn test_config() -> TestConfig {
    let module = tempfile::tempdir().unwrap();
    std::fs::write(module.path().join("main.tf"), "variable \"repo_name\" {}").unwrap();

    let mut config = PipelineConfig::new();
    config.repo_module_dir = module.path().to_path_buf();
    config.step_timeout = Duration::from_secs(5);
    config.credentials = Credentials {
        github: Some(GithubCredentials {
            token: "gh-token".to_string(),
            user: "bones-bot".to_string(),
        }),
        github_email: Some("bot@example.com".to_string()),
        github_base: Some("https://github.com/org".to_string()),
        aws: Some(AwsCredentials {
            region: "us-east-1".to_string(),
            access_key: "AKIA".to_string(),
            secret_key: "aws-secret".to_string(),
        }),
        circleci: Some(CircleCiCredentials {
            token: "ci-token".to_string(),
        }),
    };

    TestConfig {
        config,
        _module: module,
    }
}

/// Lists every file under `root` (skipping `.git`) with its contents
pub fn snapshot(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let contents = std::fs::read_to_string(e.path()).unwrap_or_default();
            (rel.to_string_lossy().replace('\\', "/"), contents)
        })
        .collect()
}

/// A recorded push
#[derive(Debug, Clone)]
pub struct Push {
    pub locator: String,
    pub message: String,
    pub files: BTreeMap<String, String>,
}

/// In-process source control backed by temporary directories
///
/// Pushed changes are written back to the repository so later checkouts see them.
#[derive(Default)]
pub struct FakeSource {
    repos: Mutex<HashMap<String, TempDir>>,
    pushes: Mutex<Vec<Push>>,
    checkouts: Mutex<Vec<PathBuf>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repo(&self, locator: &str, files: &[(&str, &str)]) {
        let dir = tempfile::tempdir().unwrap();
        for (path, contents) in files {
            let target = dir.path().join(path);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(target, contents).unwrap();
        }
        self.repos.lock().unwrap().insert(locator.to_string(), dir);
    }

    pub fn pushes(&self) -> Vec<Push> {
        self.pushes.lock().unwrap().clone()
    }

    /// Whether every checkout handed out so far has been removed from disk
    pub fn checkouts_released(&self) -> bool {
        self.checkouts.lock().unwrap().iter().all(|p| !p.exists())
    }

    pub fn checkout_count(&self) -> usize {
        self.checkouts.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceControl for FakeSource {
    async fn checkout(&self, locator: &str) -> Result<Checkout> {
        let repos = self.repos.lock().unwrap();
        let repo = repos
            .get(locator)
            .ok_or_else(|| anyhow::anyhow!("repository {} not found", locator))?;

        let dir = tempfile::tempdir()?;
        copy_tree(repo.path(), dir.path())?;
        self.checkouts
            .lock()
            .unwrap()
            .push(dir.path().to_path_buf());
        Ok(Checkout::new(dir, locator))
    }

    async fn commit_and_push(&self, checkout: &Checkout, message: &str) -> Result<bool> {
        let repos = self.repos.lock().unwrap();
        let repo = repos
            .get(checkout.locator())
            .ok_or_else(|| anyhow::anyhow!("repository {} not found", checkout.locator()))?;
        copy_tree(checkout.path(), repo.path())?;

        self.pushes.lock().unwrap().push(Push {
            locator: checkout.locator().to_string(),
            message: message.to_string(),
            files: snapshot(checkout.path()),
        });
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfraAction {
    Apply,
    Destroy,
}

/// A recorded infrastructure call
#[derive(Debug, Clone)]
pub struct InfraCall {
    pub action: InfraAction,
    /// Files present in the module directory at call time
    pub files: Vec<String>,
    pub vars: Vars,
    pub backend_key: Option<String>,
}

/// Infrastructure tool that records calls and optionally fails them
#[derive(Default)]
pub struct FakeInfra {
    calls: Mutex<Vec<InfraCall>>,
    failure: Option<String>,
}

impl FakeInfra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<InfraCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        action: InfraAction,
        dir: &Path,
        vars: &Vars,
        backend: Option<&StateBackend>,
    ) -> Result<()> {
        if !dir.is_dir() {
            anyhow::bail!("module directory {} does not exist", dir.display());
        }
        self.calls.lock().unwrap().push(InfraCall {
            action,
            files: snapshot(dir).into_keys().collect(),
            vars: vars.clone(),
            backend_key: backend.map(|b| b.key.clone()),
        });
        match &self.failure {
            Some(message) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InfraTool for FakeInfra {
    async fn apply(&self, dir: &Path, vars: &Vars, backend: Option<&StateBackend>) -> Result<()> {
        self.record(InfraAction::Apply, dir, vars, backend)
    }

    async fn destroy(
        &self,
        dir: &Path,
        vars: &Vars,
        backend: Option<&StateBackend>,
    ) -> Result<()> {
        self.record(InfraAction::Destroy, dir, vars, backend)
    }
}

/// One handler invocation seen by a [`RecordingHandler`]
#[derive(Debug, Clone)]
pub struct Invocation {
    pub handler: &'static str,
    pub step: String,
    pub action: InfraAction,
    pub repo_reference: Option<String>,
    pub data: HashMap<String, String>,
}

/// Shared, ordered log of handler invocations
pub type CallLog = Arc<Mutex<Vec<Invocation>>>;

/// Handler that records every call and returns a scripted result
pub struct RecordingHandler {
    key: &'static str,
    log: CallLog,
    artifacts: HashMap<String, StepArtifact>,
    failing_steps: HashSet<String>,
    delay: Option<Duration>,
}

impl RecordingHandler {
    pub fn new(key: &'static str, log: CallLog) -> Self {
        Self {
            key,
            log,
            artifacts: HashMap::new(),
            failing_steps: HashSet::new(),
            delay: None,
        }
    }

    /// Returns `artifact` when creating `step`
    pub fn producing(mut self, step: &str, artifact: StepArtifact) -> Self {
        self.artifacts.insert(step.to_string(), artifact);
        self
    }

    /// Fails both create and destroy for `step`
    pub fn failing_on(mut self, step: &str) -> Self {
        self.failing_steps.insert(step.to_string());
        self
    }

    /// Sleeps before answering
    pub fn sleeping(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn invoke(
        &self,
        step: &str,
        action: InfraAction,
        repo_reference: Option<&str>,
        data: &HashMap<String, String>,
    ) -> Result<()> {
        self.log.lock().unwrap().push(Invocation {
            handler: self.key,
            step: step.to_string(),
            action,
            repo_reference: repo_reference.map(str::to_string),
            data: data.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_steps.contains(step) {
            anyhow::bail!("{} failed on step {}", self.key, step);
        }
        Ok(())
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    async fn create(&self, req: CreateRequest<'_>) -> Result<StepArtifact> {
        self.invoke(&req.step.name, InfraAction::Apply, req.repo_reference, req.data)
            .await?;
        Ok(self
            .artifacts
            .get(&req.step.name)
            .cloned()
            .unwrap_or_default())
    }

    async fn destroy(&self, req: DestroyRequest<'_>) -> Result<()> {
        self.invoke(&req.step.name, InfraAction::Destroy, req.repo_reference, req.data)
            .await
    }
}
