use std::sync::Arc;

use anyhow::Context;
use bones_pipeline::{InMemoryRegistry, PipelineExecutor, ProjectRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

use config::Config;
use repository::PgRegistry;
use service::{AppState, project_service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bones_server=debug,bones_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bones server...");

    let config = Config::from_env().context("Failed to read configuration")?;
    config.validate().context("Invalid configuration")?;

    let registry: Arc<dyn ProjectRegistry> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(database_url)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Arc::new(PgRegistry::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, projects are kept in memory only");
            Arc::new(InMemoryRegistry::new())
        }
    };

    let executor = PipelineExecutor::from_config(registry, &config.pipeline);
    let state = AppState::new(executor, config.retain_tombstones);

    let recovered = project_service::recover_interrupted_runs(&state)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to recover interrupted runs: {:?}", e))?;
    if recovered > 0 {
        tracing::warn!("{} interrupted run(s) marked as failed", recovered);
    }

    // Build router with all API endpoints
    let app = api::create_router(state.clone());

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.tracker.wait_idle().await;
    tracing::info!("Bones server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining pipeline runs");
}
