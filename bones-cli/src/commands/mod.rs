//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod project;
mod project_type;

pub use project::ProjectCommands;
pub use project_type::TypeCommands;

use anyhow::Result;
use bones_core::domain::project::ProjectStatus;
use clap::Subcommand;
use colored::{ColoredString, Colorize};

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Project provisioning and teardown
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Project type (template) management
    Type {
        #[command(subcommand)]
        command: TypeCommands,
    },
}

/// Routes the command to the appropriate handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Project { command } => project::handle_project_command(command, config).await,
        Commands::Type { command } => project_type::handle_type_command(command, config).await,
    }
}

/// Status label coloured by outcome
pub(crate) fn status_label(status: ProjectStatus) -> ColoredString {
    match status {
        ProjectStatus::Ready => status.as_str().green(),
        ProjectStatus::Pending | ProjectStatus::Running => status.as_str().yellow(),
        ProjectStatus::Failed | ProjectStatus::PartiallyFailed => status.as_str().red(),
        ProjectStatus::Destroyed => status.as_str().dimmed(),
    }
}
