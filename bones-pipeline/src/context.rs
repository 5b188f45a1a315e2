//! Run-local data context
//!
//! Holds the key/value data threaded between the steps of one pipeline run:
//! - The project's own data, seeded when the run starts
//! - Derived names every handler can rely on (`APP_NAME`, `SERVICE_NAME`)
//! - Values produced by earlier steps
//! - The current repository reference
//!
//! Keys are only ever inserted or overwritten, never removed.

use bones_core::domain::project::Project;
use bones_core::slugify;
use std::collections::HashMap;

use crate::handler::StepArtifact;

/// Slug of the project name
pub const APP_NAME: &str = "APP_NAME";

/// Slug of the project name with a `-service` suffix
pub const SERVICE_NAME: &str = "SERVICE_NAME";

/// Most recent repository reference produced by a step
pub const REPO_REFERENCE: &str = "REPO_REFERENCE";

/// Data context for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    data: HashMap<String, String>,
    repo_reference: Option<String>,
}

impl PipelineContext {
    /// Seeds a context from a project record
    ///
    /// Derived names overwrite any user-supplied value with the same key.
    pub fn seed(project: &Project) -> Self {
        let app_name = slugify(&project.name);

        let mut data = project.data.clone();
        data.insert(SERVICE_NAME.to_string(), format!("{}-service", app_name));
        data.insert(APP_NAME.to_string(), app_name);
        if let Some(repo) = &project.repo {
            data.insert(REPO_REFERENCE.to_string(), repo.clone());
        }

        Self {
            data,
            repo_reference: project.repo.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Folds a step's artifact into the context
    ///
    /// Returns the entries written, which is what the registry persists for the step.
    pub fn merge(&mut self, artifact: StepArtifact) -> HashMap<String, String> {
        let mut written = artifact.values;
        if let Some(repo) = &artifact.repo_reference {
            written.insert(REPO_REFERENCE.to_string(), repo.clone());
            self.repo_reference = Some(repo.clone());
        }

        for (key, value) in &written {
            self.data.insert(key.clone(), value.clone());
        }
        written
    }

    pub fn data(&self) -> &HashMap<String, String> {
        &self.data
    }

    pub fn repo_reference(&self) -> Option<&str> {
        self.repo_reference.as_deref()
    }

    /// Slug of the project name
    pub fn app_name(&self) -> &str {
        self.get(APP_NAME).unwrap_or_default()
    }
}
