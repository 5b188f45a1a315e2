//! Service Module
//!
//! Business logic layer for the server.
//! Services validate requests, talk to the project registry and launch
//! pipeline runs in the background.

pub mod project;
pub mod project_type;
pub mod tracker;

// Re-export for convenience
pub use project as project_service;
pub use project_type as project_type_service;

use bones_pipeline::{PipelineExecutor, ProjectRegistry};
use std::sync::Arc;

use tracker::RunTracker;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn ProjectRegistry>,
    pub executor: PipelineExecutor,
    pub tracker: RunTracker,
    /// Keep `Destroyed` projects until they are purged explicitly
    pub retain_tombstones: bool,
}

impl AppState {
    pub fn new(executor: PipelineExecutor, retain_tombstones: bool) -> Self {
        Self {
            registry: Arc::clone(executor.registry()),
            executor,
            tracker: RunTracker::new(),
            retain_tombstones,
        }
    }
}
