// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::path::PathBuf;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::csv_repository::FileArtifactRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration, optionally from a file given as the first argument
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_dashboard_config(config_path.as_deref())?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(FileArtifactRepository::new(&config.data));
    tracing::info!(
        "Reading artifacts from {} and {}",
        config.data.data_dir.display(),
        config.data.visualizations_dir.display()
    );

    // Create services (application layer)
    let state = Arc::new(AppState::new(repository, config.overview.top_stops));

    // Build router (presentation layer)
    // Note: We handle compression manually in our response builders,
    // so we don't use CompressionLayer to avoid double compression
    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting ClearLane dashboard on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
