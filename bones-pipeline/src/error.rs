//! Error types for pipeline runs

use std::time::Duration;
use thiserror::Error;

use crate::registry::RegistryError;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while loading a manifest or running its steps
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The template source has no manifest at the expected location
    #[error("Project configuration not found (skeleton.yaml missing at {path})")]
    ManifestNotFound { path: String },

    /// The manifest exists but does not have the expected step-list shape
    #[error("Project configuration not formatted correctly ({path}): {message}")]
    ManifestInvalid { path: String, message: String },

    /// A step names a handler key nobody registered
    #[error("No handler registered for key '{0}'")]
    UnknownHandler(String),

    /// A collaborator or handler failed against its external system
    #[error("{collaborator} failed: {source:#}")]
    ExternalSystem {
        collaborator: String,
        #[source]
        source: anyhow::Error,
    },

    /// A step did not finish within the configured deadline
    #[error("Step '{step}' timed out after {timeout:?}")]
    StepTimeout { step: String, timeout: Duration },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl PipelineError {
    /// Wraps a collaborator failure; the message renders the whole context chain
    pub fn external(collaborator: impl Into<String>, err: anyhow::Error) -> Self {
        Self::ExternalSystem {
            collaborator: collaborator.into(),
            source: err,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ManifestNotFound { .. })
            || matches!(self, Self::Registry(RegistryError::NotFound { .. }))
    }
}
