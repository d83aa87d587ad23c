//! TriggerMesh API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;

use clap::Parser;
use tracing::info;
use triggermesh_core::AppError;

use crate::api_config::{ApiConfig, Cli, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ApiConfig::load(cli.config.as_path())?;

    let pool = connect_and_migrate(config.database_path.as_str()).await?;
    info!(path = config.database_path.as_str(), "audit store ready");

    if cli.migrate_only {
        info!("database migrations applied successfully");
        pool.close().await;
        return Ok(());
    }

    let app_state = build_app_state(pool.clone(), &config)?;
    let app = build_router(app_state);

    let (host, port) = config.bind_address(env::var("PORT").ok().as_deref());
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to bind listener on {host}:{port}: {error}"))
        })?;

    info!(
        %host,
        port,
        jenkins_url = config.jenkins.url.as_str(),
        api_keys = config.api_keys.len(),
        "triggermesh listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))?;

    pool.close().await;
    info!("triggermesh stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
