//! Project type command handlers

use anyhow::Result;
use bones_client::BonesClient;
use bones_core::domain::project_type::ProjectType;
use bones_core::dto::project_type::CreateProjectType;
use clap::Subcommand;
use colored::Colorize;

use crate::config::Config;

/// Project type subcommands
#[derive(Subcommand)]
pub enum TypeCommands {
    /// Create a project type, or update the one with the same name
    Create {
        /// Display name; its slug is the type key
        #[arg(short, long)]
        name: String,

        /// Template source repository
        #[arg(short, long)]
        repo: String,

        /// Subdirectory of the repository holding the skeleton
        #[arg(short, long, default_value = "")]
        path: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// List all project types
    List,
    /// Get project type details
    Get {
        /// Project type slug
        slug: String,
    },
    /// Delete a project type no live project uses
    Delete {
        /// Project type slug
        slug: String,
    },
}

pub async fn handle_type_command(command: TypeCommands, config: &Config) -> Result<()> {
    let client = BonesClient::new(&config.server_url);

    match command {
        TypeCommands::Create {
            name,
            repo,
            path,
            description,
        } => {
            let project_type = client
                .save_project_type(CreateProjectType {
                    name,
                    description,
                    repo,
                    path,
                })
                .await?;

            println!("{}", "✓ Project type saved!".green().bold());
            println!("  Slug: {}", project_type.slug.cyan());
            println!("  Name: {}", project_type.name.bold());
            Ok(())
        }
        TypeCommands::List => {
            let project_types = client.list_project_types().await?;

            if project_types.is_empty() {
                println!("{}", "No project types found.".yellow());
            } else {
                println!(
                    "{}",
                    format!("Found {} project type(s):", project_types.len()).bold()
                );
                println!();
                for project_type in &project_types {
                    print_type_summary(project_type);
                }
            }
            Ok(())
        }
        TypeCommands::Get { slug } => {
            let project_type = client.get_project_type(&slug).await?;
            print_type_details(&project_type);
            Ok(())
        }
        TypeCommands::Delete { slug } => {
            client.delete_project_type(&slug).await?;
            println!(
                "{}",
                format!("✓ Project type {} deleted!", slug).green().bold()
            );
            Ok(())
        }
    }
}

fn print_type_summary(project_type: &ProjectType) {
    println!("  {} {}", "▸".cyan(), project_type.name.bold());
    println!("    Slug: {}", project_type.slug.dimmed());
    println!("    Repo: {}", template_location(project_type).dimmed());
    if let Some(desc) = &project_type.description {
        println!("    Description: {}", desc.dimmed());
    }
    println!();
}

fn print_type_details(project_type: &ProjectType) {
    println!("{}", "Project Type Details:".bold());
    println!("  Slug:        {}", project_type.slug.cyan());
    println!("  Name:        {}", project_type.name.bold());
    if let Some(desc) = &project_type.description {
        println!("  Description: {}", desc);
    }
    println!("  Template:    {}", template_location(project_type));
    println!(
        "  Created:     {}",
        project_type.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:     {}",
        project_type.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
}

fn template_location(project_type: &ProjectType) -> String {
    match project_type.path.trim_matches('/') {
        "" => project_type.repo.clone(),
        path => format!("{} ({})", project_type.repo, path),
    }
}
