//! Configuration module
//!
//! Handles CLI configuration such as the server URL.

use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Bones server
    pub server_url: String,

    /// Delay between status polls when waiting for a pipeline run
    pub poll_interval: Duration,
}
