//! Run Tracker
//!
//! Keeps the join handle of every background pipeline run, keyed by project.
//! At most one run per project is tracked at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Returned when a project already has a run in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunInProgress(pub Uuid);

impl std::fmt::Display for RunInProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Project {} already has a pipeline run in progress", self.0)
    }
}

/// Tracks spawned pipeline runs
#[derive(Clone, Default)]
pub struct RunTracker {
    runs: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<Uuid, JoinHandle<()>>> {
        // A panic while holding this lock leaves the map itself consistent
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawns `run` for `project_id` unless a run for it is still in flight
    ///
    /// The entry is removed when the run completes.
    pub fn spawn<F>(&self, project_id: Uuid, run: F) -> Result<(), RunInProgress>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut runs = self.runs();

        if runs
            .get(&project_id)
            .is_some_and(|handle| !handle.is_finished())
        {
            return Err(RunInProgress(project_id));
        }

        let tracked = Arc::clone(&self.runs);
        let handle = tokio::spawn(async move {
            run.await;
            tracked
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&project_id);
        });

        runs.insert(project_id, handle);
        Ok(())
    }

    pub fn is_active(&self, project_id: Uuid) -> bool {
        self.runs()
            .get(&project_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of runs still in flight
    pub fn active_count(&self) -> usize {
        self.runs()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Waits for every tracked run to finish
    pub async fn wait_idle(&self) {
        let handles: Vec<(Uuid, JoinHandle<()>)> = self.runs().drain().collect();

        if !handles.is_empty() {
            tracing::info!("Waiting for {} pipeline run(s) to finish", handles.len());
        }

        for (project_id, handle) in handles {
            if let Err(e) = handle.await {
                tracing::error!("Pipeline run for project {} aborted: {}", project_id, e);
            }
        }
    }
}
