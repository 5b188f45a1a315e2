//! Project domain types
//!
//! A project is created as a placeholder by the request path and then mutated
//! by its pipeline runs through [`ProjectUpdate`]s. [`Project::apply`] is the
//! single place where the lifecycle state machine is enforced, so every
//! registry implementation shares the same transition rules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Provisioned (or provisioning) project record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub type_slug: String,
    pub description: Option<String>,
    /// Repository reference, set once a step produces one
    pub repo: Option<String>,
    pub data: HashMap<String, String>,
    pub status: ProjectStatus,
    /// Status slot of the most recent pipeline run
    pub last_run: Option<PipelineRun>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Pending,
    Running,
    Ready,
    Failed,
    PartiallyFailed,
    Destroyed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "Pending",
            ProjectStatus::Running => "Running",
            ProjectStatus::Ready => "Ready",
            ProjectStatus::Failed => "Failed",
            ProjectStatus::PartiallyFailed => "PartiallyFailed",
            ProjectStatus::Destroyed => "Destroyed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(ProjectStatus::Pending),
            "Running" => Some(ProjectStatus::Running),
            "Ready" => Some(ProjectStatus::Ready),
            "Failed" => Some(ProjectStatus::Failed),
            "PartiallyFailed" => Some(ProjectStatus::PartiallyFailed),
            "Destroyed" => Some(ProjectStatus::Destroyed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which step list a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunKind {
    Generate,
    Destroy,
}

/// Record of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub kind: RunKind,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_steps: Vec<String>,
    pub failed_step: Option<String>,
    pub error: Option<String>,
}

/// A mutation applied by the pipeline executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectUpdate {
    RunStarted {
        kind: RunKind,
    },
    StepCompleted {
        step: String,
        repo: Option<String>,
        data: HashMap<String, String>,
    },
    RunSucceeded,
    RunFailed {
        failed_step: Option<String>,
        error: String,
    },
}

/// Rejected lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyRunning,
    Destroyed,
    NotRunning(ProjectStatus),
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::AlreadyRunning => write!(f, "a pipeline run is already in progress"),
            TransitionError::Destroyed => write!(f, "project has been destroyed"),
            TransitionError::NotRunning(status) => {
                write!(f, "no pipeline run in progress (status: {})", status)
            }
        }
    }
}

impl std::error::Error for TransitionError {}

impl Project {
    /// Creates a placeholder record before any pipeline step has run
    pub fn placeholder(
        name: String,
        type_slug: String,
        description: Option<String>,
        data: HashMap<String, String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            type_slug,
            description,
            repo: None,
            data,
            status: ProjectStatus::Pending,
            last_run: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ProjectStatus::Running
    }

    /// Applies a pipeline update, enforcing the lifecycle state machine.
    ///
    /// `Pending -> Running -> {Ready | Failed | PartiallyFailed}` for generate runs and
    /// `Pending -> Running -> {Destroyed | Failed}` for destroy runs. Step and terminal
    /// updates are only accepted while a run is in progress.
    pub fn apply(&mut self, update: ProjectUpdate) -> Result<(), TransitionError> {
        let now = chrono::Utc::now();

        match update {
            ProjectUpdate::RunStarted { kind } => {
                match self.status {
                    ProjectStatus::Running => return Err(TransitionError::AlreadyRunning),
                    ProjectStatus::Destroyed => return Err(TransitionError::Destroyed),
                    _ => {}
                }
                self.status = ProjectStatus::Running;
                self.last_run = Some(PipelineRun {
                    kind,
                    started_at: now,
                    completed_at: None,
                    completed_steps: Vec::new(),
                    failed_step: None,
                    error: None,
                });
            }
            ProjectUpdate::StepCompleted { step, repo, data } => {
                let run = self.running_run()?;
                run.completed_steps.push(step);
                if repo.is_some() {
                    self.repo = repo;
                }
                // Keys are never dropped mid-run, the context only grows
                self.data.extend(data);
            }
            ProjectUpdate::RunSucceeded => {
                let run = self.running_run()?;
                run.completed_at = Some(now);
                self.status = match run.kind {
                    RunKind::Generate => ProjectStatus::Ready,
                    RunKind::Destroy => ProjectStatus::Destroyed,
                };
            }
            ProjectUpdate::RunFailed { failed_step, error } => {
                let run = self.running_run()?;
                run.completed_at = Some(now);
                let status = match (run.kind, &failed_step) {
                    (RunKind::Generate, Some(_)) => ProjectStatus::PartiallyFailed,
                    _ => ProjectStatus::Failed,
                };
                run.failed_step = failed_step;
                run.error = Some(error);
                self.status = status;
            }
        }

        self.updated_at = now;
        Ok(())
    }

    fn running_run(&mut self) -> Result<&mut PipelineRun, TransitionError> {
        let status = self.status;
        match (&mut self.last_run, status) {
            (Some(run), ProjectStatus::Running) => Ok(run),
            _ => Err(TransitionError::NotRunning(status)),
        }
    }
}
