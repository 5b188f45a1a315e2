//! Skeleton manifest loading
//!
//! Materializes a template source, reads `<path>/.skeleton/skeleton.yaml` and
//! parses it into generate and destroy step lists. The checkout is dropped
//! before `load` returns, whatever the outcome.

use bones_core::domain::manifest::SkeletonManifest;
use std::sync::Arc;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::tools::resolve_subpath;
use crate::tools::source::SourceControl;

/// Manifest location relative to the template path
pub const MANIFEST_PATH: &str = ".skeleton/skeleton.yaml";

/// Loads skeleton manifests from template sources
#[derive(Clone)]
pub struct ManifestLoader {
    source: Arc<dyn SourceControl>,
}

impl ManifestLoader {
    pub fn new(source: Arc<dyn SourceControl>) -> Self {
        Self { source }
    }

    /// Loads the manifest found under `path` in `locator`
    ///
    /// Has no registry side effects.
    pub async fn load(&self, locator: &str, path: &str) -> Result<SkeletonManifest> {
        let checkout = self
            .source
            .checkout(locator)
            .await
            .map_err(|e| PipelineError::external("template", e))?;

        let display_path = format!(
            "{}/{}",
            locator.trim_end_matches('/'),
            format!("{}/{}", path.trim_matches('/'), MANIFEST_PATH).trim_start_matches('/')
        );

        let file = resolve_subpath(checkout.path(), path)
            .map_err(|e| PipelineError::ManifestInvalid {
                path: display_path.clone(),
                message: e.to_string(),
            })?
            .join(MANIFEST_PATH);

        let raw = match tokio::fs::read_to_string(&file).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::ManifestNotFound { path: display_path });
            }
            Err(e) => {
                return Err(PipelineError::ManifestInvalid {
                    path: display_path,
                    message: e.to_string(),
                });
            }
        };

        let manifest = parse_manifest(&raw).map_err(|message| PipelineError::ManifestInvalid {
            path: display_path.clone(),
            message,
        })?;

        debug!(
            "Loaded manifest {} ({} generate, {} destroy steps)",
            display_path,
            manifest.generate_steps().len(),
            manifest.destroy_steps().len()
        );
        Ok(manifest)
    }
}

/// Parses manifest text into step lists
///
/// An empty document is rejected; a document with neither list yields two empty lists.
pub fn parse_manifest(raw: &str) -> std::result::Result<SkeletonManifest, String> {
    if raw.trim().is_empty() {
        return Err("manifest is empty".to_string());
    }

    let manifest: SkeletonManifest = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;

    for step in manifest
        .generate_steps()
        .iter()
        .chain(manifest.destroy_steps())
    {
        if step.name.trim().is_empty() {
            return Err("step name cannot be empty".to_string());
        }
        if step.handler.trim().is_empty() {
            return Err(format!("step '{}' has no handler", step.name));
        }
    }

    Ok(manifest)
}
