//! Template rendering
//!
//! Substitutes `{{ .KEY }}` placeholders with values from the pipeline context
//! and copies template trees between checkouts.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Renders every placeholder in `text`
///
/// Fails listing every key that has no value in `data`.
pub fn render(text: &str, data: &HashMap<String, String>) -> Result<String> {
    let mut missing = BTreeSet::new();

    let rendered = PLACEHOLDER.replace_all(text, |caps: &Captures| match data.get(&caps[1]) {
        Some(value) => value.clone(),
        None => {
            missing.insert(caps[1].to_string());
            String::new()
        }
    });

    if !missing.is_empty() {
        let keys: Vec<String> = missing.into_iter().collect();
        anyhow::bail!("No value for template keys: {}", keys.join(", "));
    }

    Ok(rendered.into_owned())
}

/// Renders every file under `src` into the same relative location under `dest`
///
/// Returns the number of files written. Non UTF-8 files are copied unchanged.
pub fn render_tree(src: &Path, dest: &Path, data: &HashMap<String, String>) -> Result<usize> {
    let mut written = 0;

    for (path, target) in files(src, dest)? {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let rendered =
                    render(&text, data).with_context(|| format!("in {}", path.display()))?;
                std::fs::write(&target, rendered)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                std::fs::copy(&path, &target)
                    .with_context(|| format!("Failed to copy {}", path.display()))?;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        }
        written += 1;
    }

    debug!(
        "Rendered {} files from {} into {}",
        written,
        src.display(),
        dest.display()
    );
    Ok(written)
}

/// Copies every file under `src` to `dest`, skipping `.git`
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;
    for (path, target) in files(src, dest)? {
        std::fs::copy(&path, &target)
            .with_context(|| format!("Failed to copy {}", path.display()))?;
        copied += 1;
    }
    Ok(copied)
}

/// Lists (source, target) pairs for every file under `src`, creating target directories
fn files(src: &Path, dest: &Path) -> Result<Vec<(std::path::PathBuf, std::path::PathBuf)>> {
    if !src.is_dir() {
        anyhow::bail!("Template directory {} does not exist", src.display());
    }

    let mut pairs = Vec::new();
    for entry in WalkDir::new(src)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry.context("Failed to read template directory entry")?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            pairs.push((entry.path().to_path_buf(), target));
        }
    }
    Ok(pairs)
}
