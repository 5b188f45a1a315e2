//! Test doubles shared by the service and API tests

use async_trait::async_trait;
use bones_core::domain::project_type::ProjectType;
use bones_core::dto::project_type::CreateProjectType;
use bones_pipeline::context::APP_NAME;
use bones_pipeline::registry::{InMemoryRegistry, ProjectRegistry};
use bones_pipeline::tools::source::{Checkout, SourceControl};
use bones_pipeline::{
    CreateRequest, DestroyRequest, Handler, HandlerRegistry, ManifestLoader, PipelineExecutor,
    StepArtifact,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::service::AppState;
use crate::service::tracker::RunTracker;

pub const TEMPLATE_REPO: &str = "https://git.example.com/skeletons";

/// Repository every generated project pushes to
pub const PROJECT_REPO: &str = "https://git.example.com/apps/demo";

/// Manifest with one `echo` step that produces the repository
pub const ECHO_MANIFEST: &str = r#"
generate:
  steps:
    - { name: repo, handler: echo }
destroy:
  steps:
    - { name: repo, handler: echo }
"#;

/// Manifest whose only step waits long enough to observe the run in flight
pub const SLOW_MANIFEST: &str = r#"
generate:
  steps:
    - { name: repo, handler: slow }
destroy:
  steps:
    - { name: repo, handler: slow }
"#;

/// Source control that materializes fixed file sets
#[derive(Default)]
pub struct StaticSource {
    repos: HashMap<String, Vec<(String, String)>>,
}

impl StaticSource {
    pub fn with_repo(mut self, locator: &str, files: &[(&str, &str)]) -> Self {
        self.repos.insert(
            locator.to_string(),
            files
                .iter()
                .map(|(path, contents)| (path.to_string(), contents.to_string()))
                .collect(),
        );
        self
    }
}

#[async_trait]
impl SourceControl for StaticSource {
    async fn checkout(&self, locator: &str) -> anyhow::Result<Checkout> {
        let files = self
            .repos
            .get(locator)
            .ok_or_else(|| anyhow::anyhow!("repository {} not found", locator))?;

        let dir = tempfile::tempdir()?;
        for (path, contents) in files {
            let file = dir.path().join(path);
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(file, contents)?;
        }

        Ok(Checkout::new(dir, locator))
    }

    async fn commit_and_push(&self, _checkout: &Checkout, _message: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Handler that names the repository after the app
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    fn key(&self) -> &'static str {
        "echo"
    }

    async fn create(&self, req: CreateRequest<'_>) -> anyhow::Result<StepArtifact> {
        let app = req
            .data
            .get(APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("APP_NAME missing"))?;
        Ok(StepArtifact::repo(PROJECT_REPO).with_value("REPO_NAME", app.as_str()))
    }

    async fn destroy(&self, _req: DestroyRequest<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Handler that sleeps before succeeding
pub struct SlowHandler(pub Duration);

#[async_trait]
impl Handler for SlowHandler {
    fn key(&self) -> &'static str {
        "slow"
    }

    async fn create(&self, _req: CreateRequest<'_>) -> anyhow::Result<StepArtifact> {
        tokio::time::sleep(self.0).await;
        Ok(StepArtifact::default())
    }

    async fn destroy(&self, _req: DestroyRequest<'_>) -> anyhow::Result<()> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

/// Builds an app state over an in-memory registry and a template repo holding `manifest`
pub fn app_state(manifest: &str, retain_tombstones: bool) -> AppState {
    let registry: Arc<dyn ProjectRegistry> = Arc::new(InMemoryRegistry::new());
    let source = StaticSource::default()
        .with_repo(
            TEMPLATE_REPO,
            &[("go/.skeleton/skeleton.yaml", manifest), ("go/README.md", "# app")],
        )
        .with_repo(PROJECT_REPO, &[(".skeleton/skeleton.yaml", manifest)]);

    let mut handlers = HandlerRegistry::new();
    handlers.register(EchoHandler);
    handlers.register(SlowHandler(Duration::from_millis(300)));

    let executor = PipelineExecutor::new(
        Arc::clone(&registry),
        handlers,
        ManifestLoader::new(Arc::new(source)),
        Duration::from_secs(5),
    );

    AppState {
        registry,
        executor,
        tracker: RunTracker::new(),
        retain_tombstones,
    }
}

pub fn go_type() -> CreateProjectType {
    CreateProjectType {
        name: "Go App".to_string(),
        description: Some("Go service skeleton".to_string()),
        repo: TEMPLATE_REPO.to_string(),
        path: "go".to_string(),
    }
}

pub async fn seed_go_type(state: &AppState) -> ProjectType {
    state
        .registry
        .upsert_project_type(go_type().into())
        .await
        .unwrap()
}
