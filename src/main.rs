use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use geomesh::handlers::{AppState, create_router};
use geomesh::{Config, FacilityIndex, GeoMeshService};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // Load configuration
    let config = Config::load();
    config.validate().context("Invalid configuration")?;

    // Dataset and index are built once and never change
    let index = FacilityIndex::load(&config.dataset.path, config.index.metric)
        .with_context(|| format!("Failed to load facility dataset {}", config.dataset.path))?;

    let service = GeoMeshService::new(&config, index).context("Failed to create service")?;
    let router = create_router(AppState::new(service));

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind {}", config.server.bind))?;
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "Serving query page");

    axum::serve(listener, router).await?;
    Ok(())
}
