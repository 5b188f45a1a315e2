//! Server configuration

use bones_pipeline::PipelineConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// Postgres connection string; the in-memory registry is used when unset
    pub database_url: Option<String>,

    /// Keep destroyed projects as `Destroyed` tombstones until purged
    pub retain_tombstones: bool,

    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            retain_tombstones: true,
            pipeline: PipelineConfig::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - BONES_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional)
    /// - BONES_RETAIN_TOMBSTONES (optional, default: true)
    ///
    /// plus everything read by [`PipelineConfig::from_env`].
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let retain_tombstones = match std::env::var("BONES_RETAIN_TOMBSTONES") {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                anyhow::anyhow!("BONES_RETAIN_TOMBSTONES must be true or false, got '{}'", value)
            })?,
            Err(_) => defaults.retain_tombstones,
        };

        Ok(Self {
            bind_addr: std::env::var("BONES_BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            retain_tombstones,
            pipeline: PipelineConfig::from_env()?,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }
        self.pipeline.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
