// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::refresh_scheduler::{PageIntervals, RefreshScheduler};
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_fetch_service::HttpFetchService;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, defaulting to info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    config.log_config();

    // Create the shared fetcher (infrastructure layer)
    let fetcher = Arc::new(HttpFetchService::new(&config.fetch)?);

    // Create services (application layer)
    let service = DashboardService::from_config(fetcher, &config)?;
    let intervals = PageIntervals::from_settings(&config.pages);
    let (feeds, tasks) = RefreshScheduler::new(service, intervals).spawn();

    // Create application state
    let state = Arc::new(AppState {
        title: config.server.title.clone(),
        feeds,
        intervals,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port).parse()?;
    tracing::info!("Starting home-dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tasks.iter().for_each(|task| task.abort());
    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
