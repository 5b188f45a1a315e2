//! Project command handlers
//!
//! Handles project creation, listing, inspection, teardown and purging.
//! Create and delete return as soon as the server has launched the run;
//! `--wait` polls until the run reaches a terminal status.

use anyhow::{Context, Result, bail};
use bones_client::BonesClient;
use bones_core::domain::project::{Project, ProjectStatus};
use bones_core::dto::project::CreateProject;
use clap::Subcommand;
use colored::Colorize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::commands::status_label;
use crate::config::Config;
use crate::id_resolver::resolve_project_id;
use crate::types::IdOrPrefix;

/// Project subcommands
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project from a project type
    Create {
        /// Project type slug
        #[arg(short = 't', long = "type")]
        type_slug: String,

        /// Project name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Template data as key=value pairs (e.g., OWNER=team-a)
        #[arg(long = "data", value_parser = parse_key_val)]
        data: Vec<(String, String)>,

        /// Wait for the generate run to finish
        #[arg(short, long)]
        wait: bool,
    },
    /// List all projects
    List,
    /// Get project details
    Get {
        /// Project ID or unambiguous prefix
        id: String,

        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },
    /// Destroy a project's resources
    Delete {
        /// Project ID or unambiguous prefix
        id: String,

        /// Wait for the destroy run to finish
        #[arg(short, long)]
        wait: bool,
    },
    /// Remove a destroyed or failed project record
    Purge {
        /// Project ID or unambiguous prefix
        id: String,
    },
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    if key.is_empty() {
        bail!("invalid KEY=value: empty key in `{}`", s);
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn handle_project_command(command: ProjectCommands, config: &Config) -> Result<()> {
    let client = BonesClient::new(&config.server_url);

    match command {
        ProjectCommands::Create {
            type_slug,
            name,
            description,
            data,
            wait,
        } => {
            let req = CreateProject {
                type_slug,
                name,
                description,
                data: data.into_iter().collect::<HashMap<_, _>>(),
            };
            create_project(&client, config, req, wait).await
        }
        ProjectCommands::List => list_projects(&client).await,
        ProjectCommands::Get { id, json } => get_project(&client, &id, json).await,
        ProjectCommands::Delete { id, wait } => delete_project(&client, config, &id, wait).await,
        ProjectCommands::Purge { id } => purge_project(&client, &id).await,
    }
}

async fn create_project(
    client: &BonesClient,
    config: &Config,
    req: CreateProject,
    wait: bool,
) -> Result<()> {
    let project = client.create_project(req).await?;

    println!("{}", "✓ Project creation launched!".green().bold());
    println!("  ID:   {}", project.id.to_string().cyan());
    println!("  Name: {}", project.name.bold());
    println!("  Type: {}", project.type_slug.dimmed());

    if wait {
        let project = wait_for_run(client, config, project.id).await?;
        println!();
        print_project_details(&project);
        if project.status != ProjectStatus::Ready {
            bail!("Project {} ended as {}", project.id, project.status);
        }
    }

    Ok(())
}

async fn list_projects(client: &BonesClient) -> Result<()> {
    let projects = client.list_projects().await?;

    if projects.is_empty() {
        println!("{}", "No projects found.".yellow());
    } else {
        println!("{}", format!("Found {} project(s):", projects.len()).bold());
        println!();
        for project in &projects {
            print_project_summary(project);
        }
    }

    Ok(())
}

async fn get_project(client: &BonesClient, id: &str, json: bool) -> Result<()> {
    let uuid = resolve_project_id(client, &IdOrPrefix::parse(id)).await?;
    let project = client.get_project(uuid).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&project).context("Failed to serialize project")?
        );
    } else {
        print_project_details(&project);
    }

    Ok(())
}

async fn delete_project(client: &BonesClient, config: &Config, id: &str, wait: bool) -> Result<()> {
    let uuid = resolve_project_id(client, &IdOrPrefix::parse(id)).await?;
    let project = client.delete_project(uuid).await?;

    println!(
        "{}",
        format!("✓ Destroy launched for project {}", project.name)
            .green()
            .bold()
    );

    if wait {
        match wait_for_run(client, config, uuid).await {
            Ok(project) if project.status == ProjectStatus::Destroyed => {
                println!("  Status: {}", status_label(project.status));
            }
            Ok(project) => {
                print_project_details(&project);
                bail!("Project {} ended as {}", project.id, project.status);
            }
            // Removed after a successful destroy when the server keeps no tombstones
            Err(e) if is_not_found(&e) => {
                println!("  Project {} was destroyed and purged", uuid);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

async fn purge_project(client: &BonesClient, id: &str) -> Result<()> {
    let uuid = resolve_project_id(client, &IdOrPrefix::parse(id)).await?;
    client.purge_project(uuid).await?;

    println!(
        "{}",
        format!("✓ Project {} purged!", uuid).green().bold()
    );

    Ok(())
}

/// Polls a project until its current run reaches a terminal status
async fn wait_for_run(client: &BonesClient, config: &Config, id: Uuid) -> Result<Project> {
    println!("{}", "Waiting for the pipeline run to finish...".dimmed());

    let mut completed = 0;
    loop {
        tokio::time::sleep(config.poll_interval).await;
        let project = client.get_project(id).await?;

        if let Some(run) = &project.last_run {
            for step in run.completed_steps.iter().skip(completed) {
                println!("  {} {}", "✓".green(), step);
            }
            completed = run.completed_steps.len();
        }

        if !matches!(
            project.status,
            ProjectStatus::Pending | ProjectStatus::Running
        ) {
            return Ok(project);
        }
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<bones_client::ClientError>()
        .is_some_and(|e| e.is_not_found())
}

fn print_project_summary(project: &Project) {
    println!(
        "  {} {} [{}]",
        "▸".cyan(),
        project.name.bold(),
        status_label(project.status)
    );
    println!("    ID:      {}", project.id.to_string().dimmed());
    println!("    Type:    {}", project.type_slug.dimmed());
    if let Some(repo) = &project.repo {
        println!("    Repo:    {}", repo.dimmed());
    }
    println!(
        "    Created: {}",
        project
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

fn print_project_details(project: &Project) {
    println!("{}", "Project Details:".bold());
    println!("  ID:          {}", project.id.to_string().cyan());
    println!("  Name:        {}", project.name.bold());
    println!("  Type:        {}", project.type_slug);
    println!("  Status:      {}", status_label(project.status));
    if let Some(desc) = &project.description {
        println!("  Description: {}", desc);
    }
    if let Some(repo) = &project.repo {
        println!("  Repo:        {}", repo);
    }
    println!(
        "  Created:     {}",
        project.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:     {}",
        project.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if !project.data.is_empty() {
        println!("\n{}", "Data:".bold());
        let mut keys: Vec<&String> = project.data.keys().collect();
        keys.sort();
        for key in keys {
            println!("  {} = {}", key.cyan(), project.data[key]);
        }
    }

    if let Some(run) = &project.last_run {
        println!("\n{}", format!("Last run ({:?}):", run.kind).bold());
        println!("  Started:   {}", run.started_at.format("%Y-%m-%d %H:%M:%S"));
        if let Some(completed_at) = run.completed_at {
            println!("  Completed: {}", completed_at.format("%Y-%m-%d %H:%M:%S"));
        }
        for step in &run.completed_steps {
            println!("  {} {}", "✓".green(), step);
        }
        if let Some(step) = &run.failed_step {
            println!("  {} {}", "✗".red(), step.red());
        }
        if let Some(error) = &run.error {
            println!("  Error: {}", error.red());
        }
    }
}
