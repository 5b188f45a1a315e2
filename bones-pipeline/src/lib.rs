//! Bones Pipeline
//!
//! The manifest-driven step pipeline that provisions and tears down projects.
//!
//! This crate contains:
//! - Manifest loading: materialize a template source and parse its skeleton manifest
//! - Handler registry: named capabilities dispatched by manifest step keys
//! - Concrete handlers: source repository, infrastructure and CI registration
//! - Collaborators: thin wrappers over git, terraform and template rendering
//! - Executor: sequential step runs threading a shared data context
//! - Project registry: the concurrency-safe store of projects and project types

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handler;
pub mod manifest;
pub mod registry;
pub mod tools;

#[cfg(test)]
mod testing;

pub use config::{Credentials, PipelineConfig};
pub use context::PipelineContext;
pub use error::{PipelineError, Result};
pub use executor::PipelineExecutor;
pub use handler::{CreateRequest, DestroyRequest, Handler, HandlerRegistry, StepArtifact};
pub use manifest::ManifestLoader;
pub use registry::{InMemoryRegistry, ProjectRegistry, RegistryError};
