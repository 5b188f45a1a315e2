//! External collaborators
//!
//! Thin wrappers over the tools the concrete handlers drive:
//! - `source`: cloning, committing and pushing git repositories
//! - `terraform`: applying and destroying infrastructure modules
//! - `template`: rendering `{{ .KEY }}` placeholders into files

pub mod source;
pub mod template;
pub mod terraform;

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Runs a command to completion and returns its stdout
///
/// A non-zero exit status is an error carrying the trimmed stderr. `redact` lists
/// substrings (tokens) that must never reach logs or error messages.
pub(crate) async fn run_command(mut cmd: Command, redact: &[&str]) -> Result<String> {
    let program = format!("{:?}", cmd.as_std().get_program());
    let shown = redact_all(&format!("{:?}", cmd.as_std()), redact);
    debug!(command = %shown, "Running");

    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to execute {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "{} exited with {}: {}",
            program,
            output.status,
            redact_all(stderr.trim(), redact)
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn redact_all(text: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(text.to_string(), |acc, secret| acc.replace(secret, "***"))
}

/// Joins a manifest-supplied relative path onto a checkout root
///
/// Leading slashes are ignored (`/go` and `go` name the same directory). Paths that
/// would escape the root are rejected.
pub fn resolve_subpath(root: &Path, sub: &str) -> Result<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(sub).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                anyhow::bail!("Path '{}' escapes the checkout", sub)
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_subpath() {
        let root = Path::new("/tmp/checkout");
        assert_eq!(
            resolve_subpath(root, "/go").unwrap(),
            PathBuf::from("/tmp/checkout/go")
        );
        assert_eq!(
            resolve_subpath(root, "go/./infra").unwrap(),
            PathBuf::from("/tmp/checkout/go/infra")
        );
        assert_eq!(resolve_subpath(root, "").unwrap(), root.to_path_buf());
        assert!(resolve_subpath(root, "../etc").is_err());
    }

    #[test]
    fn test_redact_all() {
        assert_eq!(
            redact_all("https://tok123@github.com/x", &["tok123", ""]),
            "https://***@github.com/x"
        );
    }

    #[tokio::test]
    async fn test_run_command_reports_failure() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo secret-value >&2; exit 3");

        let err = run_command(cmd, &["secret-value"]).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("***"));
        assert!(!msg.contains("secret-value"));
    }

    #[tokio::test]
    async fn test_run_command_returns_stdout() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo hello");
        assert_eq!(run_command(cmd, &[]).await.unwrap().trim(), "hello");
    }
}
