//! Pipeline configuration
//!
//! Defines the tool locations, remote-state settings, step deadline and the
//! environment-supplied credentials used by the concrete handlers.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::tools::terraform::StateBackend;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum time a single step may run before it is failed
    pub step_timeout: Duration,

    /// Terraform binary used for every infrastructure step
    pub terraform_bin: PathBuf,

    /// Git binary used for checkouts and pushes
    pub git_bin: PathBuf,

    /// Terraform module that creates and deletes source repositories
    pub repo_module_dir: PathBuf,

    /// Bucket holding remote terraform state
    pub state_bucket: String,

    /// Region of the remote state bucket
    pub state_region: String,

    /// VPC the application infrastructure is placed in
    pub vpc_id: String,

    pub credentials: Credentials,
}

impl PipelineConfig {
    /// Creates a configuration with defaults and no credentials
    pub fn new() -> Self {
        Self {
            step_timeout: Duration::from_secs(1800),
            terraform_bin: PathBuf::from("/usr/bin/terraform"),
            git_bin: PathBuf::from("git"),
            repo_module_dir: PathBuf::from("/go/terraform"),
            state_bucket: "bones-server".to_string(),
            state_region: "us-east-1".to_string(),
            vpc_id: "vpc-c92c8baf".to_string(),
            credentials: Credentials::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - BONES_STEP_TIMEOUT (seconds, default: 1800)
    /// - TERRAFORM_BIN (default: /usr/bin/terraform, /usr/local/bin/terraform when SA_LOCAL=true)
    /// - GIT_BIN (default: git)
    /// - BONES_REPO_MODULE_DIR (default: /go/terraform)
    /// - BONES_STATE_BUCKET (default: bones-server)
    /// - BONES_STATE_REGION (default: us-east-1)
    /// - BONES_VPC_ID
    /// - GITHUB, GITHUB_USER, GITHUB_EMAIL, GITHUB_BASE, AWS, CIRCLECI (credentials)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let step_timeout = std::env::var("BONES_STEP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.step_timeout);

        let terraform_bin = match std::env::var("TERRAFORM_BIN") {
            Ok(bin) => PathBuf::from(bin),
            Err(_) if std::env::var("SA_LOCAL").as_deref() == Ok("true") => {
                PathBuf::from("/usr/local/bin/terraform")
            }
            Err(_) => defaults.terraform_bin,
        };

        let git_bin = std::env::var("GIT_BIN")
            .map(PathBuf::from)
            .unwrap_or(defaults.git_bin);

        let repo_module_dir = std::env::var("BONES_REPO_MODULE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.repo_module_dir);

        Ok(Self {
            step_timeout,
            terraform_bin,
            git_bin,
            repo_module_dir,
            state_bucket: std::env::var("BONES_STATE_BUCKET").unwrap_or(defaults.state_bucket),
            state_region: std::env::var("BONES_STATE_REGION").unwrap_or(defaults.state_region),
            vpc_id: std::env::var("BONES_VPC_ID").unwrap_or(defaults.vpc_id),
            credentials: Credentials::from_env(),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.step_timeout.as_secs() == 0 {
            anyhow::bail!("step_timeout must be greater than 0");
        }

        if self.state_bucket.is_empty() {
            anyhow::bail!("state_bucket cannot be empty");
        }

        Ok(())
    }

    /// Remote state settings for the module stored under `prefix`
    ///
    /// Available only when AWS credentials are configured.
    pub fn state_backend(&self, prefix: &str) -> Option<StateBackend> {
        self.credentials.aws.as_ref().map(|aws| StateBackend {
            bucket: self.state_bucket.clone(),
            region: self.state_region.clone(),
            key: format!("{}/terraform.tfstate", prefix.trim_end_matches('/')),
            access_key: aws.access_key.clone(),
            secret_key: aws.secret_key.clone(),
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Credentials supplied through the environment
///
/// Missing or malformed entries are left empty; the handler that needs them
/// fails its step instead of the process failing at start-up.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub github: Option<GithubCredentials>,
    pub github_email: Option<String>,
    /// Base URL new repositories are created under (e.g. https://github.com/org)
    pub github_base: Option<String>,
    pub aws: Option<AwsCredentials>,
    pub circleci: Option<CircleCiCredentials>,
}

impl Credentials {
    pub fn from_env() -> Self {
        let mut github: Option<GithubCredentials> = parse_json_env("GITHUB");
        if let (Some(creds), Ok(user)) = (github.as_mut(), std::env::var("GITHUB_USER")) {
            if creds.user.is_empty() {
                creds.user = user;
            }
        }

        Self {
            github,
            github_email: std::env::var("GITHUB_EMAIL").ok(),
            github_base: std::env::var("GITHUB_BASE")
                .ok()
                .map(|base| base.trim_end_matches('/').to_string()),
            aws: parse_json_env("AWS"),
            circleci: parse_json_env("CIRCLECI"),
        }
    }
}

fn parse_json_env<T: serde::de::DeserializeOwned>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Can't parse {} credentials: {}", name, e);
            None
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct GithubCredentials {
    #[serde(rename = "GITHUB_TOKEN")]
    pub token: String,
    #[serde(rename = "GITHUB_USER", default)]
    pub user: String,
}

#[derive(Clone, Deserialize)]
pub struct AwsCredentials {
    #[serde(rename = "AWS_REGION")]
    pub region: String,
    #[serde(rename = "AWS_ACCESS_KEY")]
    pub access_key: String,
    #[serde(rename = "AWS_SECRET_KEY")]
    pub secret_key: String,
}

#[derive(Clone, Deserialize)]
pub struct CircleCiCredentials {
    #[serde(rename = "TOKEN")]
    pub token: String,
}

impl std::fmt::Debug for GithubCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubCredentials")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("region", &self.region)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for CircleCiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleCiCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}
