//! Pipeline executor
//!
//! Runs a project's generate or destroy step list:
//! 1. Mark the run started in the registry
//! 2. Load the skeleton manifest
//! 3. Resolve every step's handler before any step runs
//! 4. Run the steps strictly in order, each bounded by the step timeout
//! 5. Fold each step's output into the run context and persist it
//! 6. Record the terminal outcome
//!
//! The first failing step halts the run. Its name and error are recorded on
//! the project's `last_run`; later steps never run.

use bones_core::domain::manifest::Step;
use bones_core::domain::project::{Project, ProjectUpdate, RunKind};
use bones_core::domain::project_type::ProjectType;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};
use crate::handler::{CreateRequest, DestroyRequest, Handler, HandlerRegistry};
use crate::manifest::ManifestLoader;
use crate::registry::ProjectRegistry;
use crate::tools::source::GitCli;

/// Why a run stopped, and at which step
#[derive(Debug)]
struct StepFailure {
    /// `None` when the run failed before its first step
    step: Option<String>,
    error: PipelineError,
}

impl StepFailure {
    fn before_steps(error: PipelineError) -> Self {
        Self { step: None, error }
    }

    fn at(step: &Step, error: PipelineError) -> Self {
        Self {
            step: Some(step.name.clone()),
            error,
        }
    }
}

/// Template location a generate run reads from
struct Template<'a> {
    source: &'a str,
    path: &'a str,
}

/// Executes pipeline runs against a handler registry
#[derive(Clone)]
pub struct PipelineExecutor {
    registry: Arc<dyn ProjectRegistry>,
    handlers: Arc<HandlerRegistry>,
    loader: ManifestLoader,
    step_timeout: Duration,
}

impl PipelineExecutor {
    pub fn new(
        registry: Arc<dyn ProjectRegistry>,
        handlers: HandlerRegistry,
        loader: ManifestLoader,
        step_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            handlers: Arc::new(handlers),
            loader,
            step_timeout,
        }
    }

    /// Creates an executor wired to git, terraform and the default handlers
    pub fn from_config(registry: Arc<dyn ProjectRegistry>, config: &PipelineConfig) -> Self {
        let source = Arc::new(GitCli::new(
            &config.git_bin,
            config.credentials.github.clone(),
            config.credentials.github_email.clone(),
        ));

        Self::new(
            registry,
            HandlerRegistry::with_defaults(config),
            ManifestLoader::new(source),
            config.step_timeout,
        )
    }

    pub fn registry(&self) -> &Arc<dyn ProjectRegistry> {
        &self.registry
    }

    /// Runs the generate steps of `project_type` for `project`
    ///
    /// Returns the `Ready` project, or the error that stopped the run after it
    /// has been recorded on the project.
    pub async fn run_generate(&self, project: &Project, project_type: &ProjectType) -> Result<Project> {
        let project = self.start(project.id, RunKind::Generate).await?;
        let template = Template {
            source: &project_type.repo,
            path: &project_type.path,
        };

        let outcome = self.generate(&project, &template).await;
        self.finish(project.id, RunKind::Generate, outcome).await
    }

    /// Runs the destroy steps for `project`
    ///
    /// The manifest is read from the project's own repository when it has one,
    /// otherwise from its project type's template.
    pub async fn run_destroy(&self, project: &Project) -> Result<Project> {
        let project = self.start(project.id, RunKind::Destroy).await?;

        let outcome = self.destroy(&project).await;
        self.finish(project.id, RunKind::Destroy, outcome).await
    }

    async fn start(&self, id: Uuid, kind: RunKind) -> Result<Project> {
        let project = self
            .registry
            .update_from_pipeline(id, ProjectUpdate::RunStarted { kind })
            .await?;
        info!("Started {:?} run for project {} ({})", kind, project.name, id);
        Ok(project)
    }

    async fn generate(
        &self,
        project: &Project,
        template: &Template<'_>,
    ) -> std::result::Result<(), StepFailure> {
        let manifest = self
            .loader
            .load(template.source, template.path)
            .await
            .map_err(StepFailure::before_steps)?;
        let steps = manifest.generate_steps();
        let handlers = self
            .handlers
            .resolve(steps)
            .map_err(StepFailure::before_steps)?;

        let mut ctx = PipelineContext::seed(project);

        for (step, handler) in steps.iter().zip(handlers) {
            debug!(
                "Running generate step '{}' ({}) for project {}",
                step.name,
                handler.key(),
                project.id
            );

            let req = CreateRequest {
                project_name: &project.name,
                repo_reference: ctx.repo_reference(),
                template_source: template.source,
                template_path: template.path,
                step,
                data: ctx.data(),
            };
            let artifact = self
                .bounded(step, handler.as_ref(), handler.create(req))
                .await?;

            let repo = artifact.repo_reference.clone();
            let written = ctx.merge(artifact);
            self.step_completed(project.id, step, repo, written).await?;
        }

        Ok(())
    }

    async fn destroy(&self, project: &Project) -> std::result::Result<(), StepFailure> {
        let manifest = match project.repo.as_deref() {
            Some(repo) => self.loader.load(repo, "").await,
            None => {
                warn!(
                    "Project {} has no repository, reading destroy steps from its template",
                    project.id
                );
                match self.registry.get_project_type(&project.type_slug).await {
                    Ok(project_type) => {
                        self.loader
                            .load(&project_type.repo, &project_type.path)
                            .await
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
        .map_err(StepFailure::before_steps)?;

        let steps = manifest.destroy_steps();
        let handlers = self
            .handlers
            .resolve(steps)
            .map_err(StepFailure::before_steps)?;

        let ctx = PipelineContext::seed(project);

        for (step, handler) in steps.iter().zip(handlers) {
            debug!(
                "Running destroy step '{}' ({}) for project {}",
                step.name,
                handler.key(),
                project.id
            );

            let req = DestroyRequest {
                project_name: &project.name,
                repo_reference: ctx.repo_reference(),
                step,
                data: ctx.data(),
            };
            self.bounded(step, handler.as_ref(), handler.destroy(req))
                .await?;

            self.step_completed(project.id, step, None, HashMap::new())
                .await?;
        }

        Ok(())
    }

    /// Awaits one handler call under the step timeout
    async fn bounded<T>(
        &self,
        step: &Step,
        handler: &dyn Handler,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> std::result::Result<T, StepFailure> {
        match tokio::time::timeout(self.step_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StepFailure::at(step, PipelineError::external(handler.key(), e))),
            Err(_) => Err(StepFailure::at(
                step,
                PipelineError::StepTimeout {
                    step: step.name.clone(),
                    timeout: self.step_timeout,
                },
            )),
        }
    }

    async fn step_completed(
        &self,
        id: Uuid,
        step: &Step,
        repo: Option<String>,
        data: HashMap<String, String>,
    ) -> std::result::Result<(), StepFailure> {
        self.registry
            .update_from_pipeline(
                id,
                ProjectUpdate::StepCompleted {
                    step: step.name.clone(),
                    repo,
                    data,
                },
            )
            .await
            .map(|_| ())
            .map_err(|e| StepFailure::at(step, e.into()))
    }

    async fn finish(
        &self,
        id: Uuid,
        kind: RunKind,
        outcome: std::result::Result<(), StepFailure>,
    ) -> Result<Project> {
        match outcome {
            Ok(()) => {
                let project = self
                    .registry
                    .update_from_pipeline(id, ProjectUpdate::RunSucceeded)
                    .await?;
                info!(
                    "{:?} run for project {} finished: {}",
                    kind, id, project.status
                );
                Ok(project)
            }
            Err(failure) => {
                match &failure.step {
                    Some(step) => error!(
                        "{:?} run for project {} failed at step '{}': {}",
                        kind, id, step, failure.error
                    ),
                    None => error!("{:?} run for project {} failed: {}", kind, id, failure.error),
                }

                let update = ProjectUpdate::RunFailed {
                    failed_step: failure.step,
                    error: failure.error.to_string(),
                };
                if let Err(e) = self.registry.update_from_pipeline(id, update).await {
                    error!("Failed to record failure for project {}: {}", id, e);
                }
                Err(failure.error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{APP_NAME, REPO_REFERENCE};
    use crate::handler::StepArtifact;
    use crate::registry::{InMemoryRegistry, RegistryError};
    use crate::testing::{CallLog, FakeSource, InfraAction, RecordingHandler};
    use bones_core::domain::project::ProjectStatus;
    use bones_core::dto::project_type::CreateProjectType;

    const TEMPLATE: &str = "https://git.example.com/skeletons";

    struct Harness {
        registry: Arc<InMemoryRegistry>,
        source: Arc<FakeSource>,
        log: CallLog,
        project_type: ProjectType,
    }

    impl Harness {
        async fn new(manifest: &str) -> Self {
            let registry = Arc::new(InMemoryRegistry::new());
            let source = Arc::new(FakeSource::new());
            source.add_repo(TEMPLATE, &[("go/.skeleton/skeleton.yaml", manifest)]);

            let project_type = registry
                .upsert_project_type(
                    CreateProjectType {
                        name: "Go App".to_string(),
                        description: None,
                        repo: TEMPLATE.to_string(),
                        path: "/go".to_string(),
                    }
                    .into(),
                )
                .await
                .unwrap();

            Self {
                registry,
                source,
                log: CallLog::default(),
                project_type,
            }
        }

        fn handler(&self, key: &'static str) -> RecordingHandler {
            RecordingHandler::new(key, self.log.clone())
        }

        fn executor(&self, handlers: Vec<RecordingHandler>, timeout: Duration) -> PipelineExecutor {
            let mut registry = HandlerRegistry::new();
            for handler in handlers {
                registry.register(handler);
            }
            PipelineExecutor::new(
                self.registry.clone(),
                registry,
                ManifestLoader::new(self.source.clone()),
                timeout,
            )
        }

        async fn project(&self, name: &str) -> Project {
            self.registry
                .create_placeholder(Project::placeholder(
                    name.to_string(),
                    self.project_type.slug.clone(),
                    None,
                    HashMap::from([("OWNER".to_string(), "team-a".to_string())]),
                ))
                .await
                .unwrap()
        }

        fn steps(&self) -> Vec<String> {
            self.log.lock().unwrap().iter().map(|i| i.step.clone()).collect()
        }
    }

    const THREE_STEPS: &str = r#"
generate:
  steps:
    - {name: a, handler: first}
    - {name: b, handler: second}
    - {name: c, handler: third}
destroy:
  steps:
    - {name: c, handler: third}
    - {name: a, handler: first}
"#;

    const REPO_THEN_INFRA: &str = r#"
generate:
  steps:
    - {name: repo, handler: github}
    - {name: infra, handler: aws}
destroy:
  steps:
    - {name: infra, handler: aws}
    - {name: repo, handler: github}
"#;

    #[tokio::test]
    async fn test_steps_run_in_manifest_order() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(
            vec![
                h.handler("first").sleeping(Duration::from_millis(20)),
                h.handler("second"),
                h.handler("third"),
            ],
            Duration::from_secs(5),
        );
        let project = h.project("My App").await;

        let done = executor
            .run_generate(&project, &h.project_type)
            .await
            .unwrap();

        assert_eq!(h.steps(), vec!["a", "b", "c"]);
        assert_eq!(done.status, ProjectStatus::Ready);
        assert_eq!(
            done.last_run.unwrap().completed_steps,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(h.source.checkouts_released());
    }

    #[tokio::test]
    async fn test_context_flows_to_later_steps() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(
            vec![
                h.handler("first")
                    .producing("a", StepArtifact::default().with_value("DB_HOST", "db-1")),
                h.handler("second")
                    .producing("b", StepArtifact::default().with_value("DB_HOST", "db-2")),
                h.handler("third"),
            ],
            Duration::from_secs(5),
        );
        let project = h.project("My App").await;

        let done = executor
            .run_generate(&project, &h.project_type)
            .await
            .unwrap();

        let log = h.log.lock().unwrap().clone();
        assert_eq!(log[0].data.get(APP_NAME).map(String::as_str), Some("my-app"));
        assert_eq!(
            log[0].data.get("SERVICE_NAME").map(String::as_str),
            Some("my-app-service")
        );
        assert_eq!(log[0].data.get("OWNER").map(String::as_str), Some("team-a"));
        assert!(log[0].data.get("DB_HOST").is_none());
        assert_eq!(log[1].data.get("DB_HOST").map(String::as_str), Some("db-1"));
        assert_eq!(log[2].data.get("DB_HOST").map(String::as_str), Some("db-2"));

        assert_eq!(done.data.get("DB_HOST").map(String::as_str), Some("db-2"));
        assert_eq!(done.data.get("OWNER").map(String::as_str), Some("team-a"));
    }

    #[tokio::test]
    async fn test_repo_reference_reaches_infra_step() {
        let h = Harness::new(REPO_THEN_INFRA).await;
        let executor = h.executor(
            vec![
                h.handler("github").producing("repo", StepArtifact::repo("org/app-1")),
                h.handler("aws"),
            ],
            Duration::from_secs(5),
        );
        let project = h.project("App 1").await;

        let done = executor
            .run_generate(&project, &h.project_type)
            .await
            .unwrap();

        let log = h.log.lock().unwrap().clone();
        assert_eq!(log[0].repo_reference, None);
        assert_eq!(log[1].repo_reference.as_deref(), Some("org/app-1"));
        assert_eq!(
            log[1].data.get(REPO_REFERENCE).map(String::as_str),
            Some("org/app-1")
        );
        assert_eq!(done.repo.as_deref(), Some("org/app-1"));
    }

    #[tokio::test]
    async fn test_unknown_handler_fails_before_any_step() {
        let h = Harness::new(REPO_THEN_INFRA).await;
        let executor = h.executor(vec![h.handler("github")], Duration::from_secs(5));
        let project = h.project("My App").await;

        let err = executor
            .run_generate(&project, &h.project_type)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownHandler(ref key) if key == "aws"));

        assert!(h.steps().is_empty());
        let stored = h.registry.get_project(project.id).await.unwrap();
        assert_eq!(stored.status, ProjectStatus::Failed);
        assert_eq!(stored.repo, project.repo);
        assert_eq!(stored.data, project.data);

        let run = stored.last_run.unwrap();
        assert!(run.completed_steps.is_empty());
        assert!(run.failed_step.is_none());
        assert!(run.error.unwrap().contains("aws"));
    }

    #[tokio::test]
    async fn test_missing_manifest_fails_project() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(vec![h.handler("first")], Duration::from_secs(5));
        let project = h.project("My App").await;

        let other_type = h
            .registry
            .upsert_project_type(
                CreateProjectType {
                    name: "Rust App".to_string(),
                    description: None,
                    repo: TEMPLATE.to_string(),
                    path: "/rust".to_string(),
                }
                .into(),
            )
            .await
            .unwrap();

        let err = executor
            .run_generate(&project, &other_type)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ManifestNotFound { .. }));

        let stored = h.registry.get_project(project.id).await.unwrap();
        assert_eq!(stored.status, ProjectStatus::Failed);
        assert!(stored.last_run.unwrap().error.unwrap().contains("skeleton.yaml"));
        assert!(h.steps().is_empty());
        assert!(h.source.checkouts_released());
    }

    #[tokio::test]
    async fn test_failing_step_halts_run() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(
            vec![
                h.handler("first")
                    .producing("a", StepArtifact::default().with_value("A_DONE", "yes")),
                h.handler("second").failing_on("b"),
                h.handler("third"),
            ],
            Duration::from_secs(5),
        );
        let project = h.project("My App").await;

        let err = executor
            .run_generate(&project, &h.project_type)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExternalSystem { ref collaborator, .. } if collaborator == "second"
        ));

        assert_eq!(h.steps(), vec!["a", "b"]);
        let stored = h.registry.get_project(project.id).await.unwrap();
        assert_eq!(stored.status, ProjectStatus::PartiallyFailed);
        assert_eq!(stored.data.get("A_DONE").map(String::as_str), Some("yes"));

        let run = stored.last_run.unwrap();
        assert_eq!(run.completed_steps, vec!["a".to_string()]);
        assert_eq!(run.failed_step.as_deref(), Some("b"));
        assert!(run.error.unwrap().contains("second failed on step b"));
    }

    #[tokio::test]
    async fn test_step_timeout() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(
            vec![
                h.handler("first").sleeping(Duration::from_secs(10)),
                h.handler("second"),
                h.handler("third"),
            ],
            Duration::from_millis(50),
        );
        let project = h.project("My App").await;

        let err = executor
            .run_generate(&project, &h.project_type)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StepTimeout { ref step, .. } if step == "a"));

        assert_eq!(h.steps(), vec!["a"]);
        let stored = h.registry.get_project(project.id).await.unwrap();
        assert_eq!(stored.status, ProjectStatus::PartiallyFailed);
        assert_eq!(stored.last_run.unwrap().failed_step.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_generate_then_destroy_round_trip() {
        let h = Harness::new(REPO_THEN_INFRA).await;
        h.source
            .add_repo("org/app-1", &[(".skeleton/skeleton.yaml", REPO_THEN_INFRA)]);
        let executor = h.executor(
            vec![
                h.handler("github").producing("repo", StepArtifact::repo("org/app-1")),
                h.handler("aws"),
            ],
            Duration::from_secs(5),
        );
        let project = h.project("App 1").await;

        let generated = executor
            .run_generate(&project, &h.project_type)
            .await
            .unwrap();
        let destroyed = executor.run_destroy(&generated).await.unwrap();
        assert_eq!(destroyed.status, ProjectStatus::Destroyed);

        let log = h.log.lock().unwrap().clone();
        let destroys: Vec<_> = log
            .iter()
            .filter(|i| i.action == InfraAction::Destroy)
            .collect();
        assert_eq!(destroys.len(), 2);
        assert_eq!(destroys[0].handler, "aws");
        assert_eq!(destroys[1].handler, "github");
        for call in destroys {
            assert_eq!(call.repo_reference.as_deref(), Some("org/app-1"));
        }

        // Tombstones never run again
        let err = executor.run_destroy(&destroyed).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Registry(RegistryError::Transition { .. })
        ));
    }

    #[tokio::test]
    async fn test_destroy_without_repo_uses_template() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(
            vec![h.handler("first"), h.handler("second"), h.handler("third")],
            Duration::from_secs(5),
        );
        let project = h.project("My App").await;

        let done = executor.run_destroy(&project).await.unwrap();
        assert_eq!(done.status, ProjectStatus::Destroyed);
        assert_eq!(h.steps(), vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_destroy_failure_is_failed() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(
            vec![
                h.handler("first"),
                h.handler("second"),
                h.handler("third").failing_on("c"),
            ],
            Duration::from_secs(5),
        );
        let project = h.project("My App").await;

        assert!(executor.run_destroy(&project).await.is_err());
        assert_eq!(h.steps(), vec!["c"]);

        let stored = h.registry.get_project(project.id).await.unwrap();
        assert_eq!(stored.status, ProjectStatus::Failed);
        assert_eq!(stored.last_run.unwrap().failed_step.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_running() {
        let h = Harness::new(THREE_STEPS).await;
        let executor = h.executor(
            vec![
                h.handler("first").sleeping(Duration::from_millis(200)),
                h.handler("second"),
                h.handler("third"),
            ],
            Duration::from_secs(5),
        );
        let project = h.project("My App").await;
        let project_type = h.project_type.clone();

        let background = {
            let executor = executor.clone();
            let project = project.clone();
            tokio::spawn(async move { executor.run_generate(&project, &project_type).await })
        };

        // Wait until the first run has started
        for _ in 0..100 {
            if h.registry.get_project(project.id).await.unwrap().is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let err = executor.run_destroy(&project).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Registry(RegistryError::Transition { .. })
        ));

        let done = background.await.unwrap().unwrap();
        assert_eq!(done.status, ProjectStatus::Ready);
    }

    /// Names each project's repository after its app
    struct PerProjectRepo;

    #[async_trait::async_trait]
    impl Handler for PerProjectRepo {
        fn key(&self) -> &'static str {
            "github"
        }

        async fn create(&self, req: CreateRequest<'_>) -> anyhow::Result<StepArtifact> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let app = req.data.get(APP_NAME).cloned().unwrap_or_default();
            Ok(StepArtifact::repo(format!("org/{}", app)).with_value("SEEN_BY", app))
        }

        async fn destroy(&self, _req: DestroyRequest<'_>) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrent_runs_stay_isolated() {
        let h = Harness::new(REPO_THEN_INFRA).await;

        let mut handlers = HandlerRegistry::new();
        handlers.register(PerProjectRepo);
        handlers.register(h.handler("aws").sleeping(Duration::from_millis(10)));
        let executor = PipelineExecutor::new(
            h.registry.clone(),
            handlers,
            ManifestLoader::new(h.source.clone()),
            Duration::from_secs(5),
        );

        let mut tasks = Vec::new();
        for i in 0..12 {
            let project = h.project(&format!("App {}", i)).await;
            let executor = executor.clone();
            let project_type = h.project_type.clone();
            tasks.push(tokio::spawn(async move {
                executor.run_generate(&project, &project_type).await
            }));
        }

        for task in tasks {
            let project = task.await.unwrap().unwrap();
            let app = slug_of(&project.name);
            assert_eq!(project.status, ProjectStatus::Ready);
            assert_eq!(project.repo, Some(format!("org/{}", app)));
            assert_eq!(project.data.get("SEEN_BY"), Some(&app));
        }

        // Every infra step saw its own project's repository
        for call in h.log.lock().unwrap().iter() {
            let app = call.data.get(APP_NAME).unwrap();
            assert_eq!(call.repo_reference, Some(format!("org/{}", app)));
        }
    }

    #[tokio::test]
    async fn test_destroy_runs_alongside_generate() {
        let h = Harness::new(REPO_THEN_INFRA).await;
        h.source
            .add_repo("org/app-a", &[(".skeleton/skeleton.yaml", REPO_THEN_INFRA)]);

        let mut handlers = HandlerRegistry::new();
        handlers.register(PerProjectRepo);
        handlers.register(h.handler("aws").sleeping(Duration::from_millis(20)));
        let executor = PipelineExecutor::new(
            h.registry.clone(),
            handlers,
            ManifestLoader::new(h.source.clone()),
            Duration::from_secs(5),
        );

        let first = h.project("App A").await;
        let first = executor
            .run_generate(&first, &h.project_type)
            .await
            .unwrap();
        h.log.lock().unwrap().clear();
        let second = h.project("App B").await;

        let destroying = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.run_destroy(&first).await })
        };
        let generating = {
            let executor = executor.clone();
            let project_type = h.project_type.clone();
            tokio::spawn(async move { executor.run_generate(&second, &project_type).await })
        };

        let destroyed = destroying.await.unwrap().unwrap();
        let generated = generating.await.unwrap().unwrap();

        assert_eq!(destroyed.status, ProjectStatus::Destroyed);
        assert_eq!(generated.status, ProjectStatus::Ready);
        assert_eq!(generated.repo.as_deref(), Some("org/app-b"));
        assert_eq!(generated.data.get("SEEN_BY").map(String::as_str), Some("app-b"));

        let stored = h.registry.get_project(destroyed.id).await.unwrap();
        assert_eq!(stored.status, ProjectStatus::Destroyed);
        assert_eq!(stored.repo.as_deref(), Some("org/app-a"));

        let log = h.log.lock().unwrap().clone();
        assert_eq!(log.len(), 2);
        for call in &log {
            let app = call.data.get(APP_NAME).unwrap();
            let expected = if app == "app-a" {
                InfraAction::Destroy
            } else {
                InfraAction::Apply
            };
            assert_eq!(call.action, expected);
            assert_eq!(call.repo_reference, Some(format!("org/{}", app)));
        }
    }

    fn slug_of(name: &str) -> String {
        bones_core::slugify(name)
    }
}
