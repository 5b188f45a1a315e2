//! Skeleton manifest types
//!
//! A skeleton manifest lives at `<template>/<path>/.skeleton/skeleton.yaml` and
//! declares two ordered step lists:
//!
//! ```yaml
//! generate:
//!   steps:
//!     - name: repo
//!       handler: github
//!     - name: infra
//!       handler: aws
//!       path: infra/aws-ecs
//! destroy:
//!   steps:
//!     - name: infra
//!       handler: aws
//! ```

use serde::{Deserialize, Serialize};

/// Parsed skeleton manifest. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonManifest {
    #[serde(default)]
    pub generate: StepList,
    #[serde(default)]
    pub destroy: StepList,
}

/// An ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepList {
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A single unit of provisioning or teardown work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// Key resolved against the handler registry at run time
    pub handler: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub cmd: String,
}

impl Step {
    pub fn new(name: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: handler.into(),
            path: String::new(),
            cmd: String::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

impl SkeletonManifest {
    pub fn generate_steps(&self) -> &[Step] {
        &self.generate.steps
    }

    pub fn destroy_steps(&self) -> &[Step] {
        &self.destroy.steps
    }
}
