//! Bones CLI
//!
//! Command-line interface for provisioning projects through the Bones server.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bones")]
#[command(about = "Bones project provisioning CLI", long_about = None)]
struct Cli {
    /// Bones server URL
    #[arg(long, env = "BONES_SERVER_URL", default_value = "http://localhost:8080")]
    server_url: String,

    /// Seconds between status polls when waiting for a run
    #[arg(long, default_value = "2")]
    poll_interval: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        poll_interval: Duration::from_secs(cli.poll_interval.max(1)),
    };

    handle_command(cli.command, &config).await
}
