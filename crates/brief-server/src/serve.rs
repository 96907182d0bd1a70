use anyhow::Result;
use brief_core::{Dispatch, API_KEY_ENV};
use tracing::{error, info, warn};

use crate::config::BriefConfig;
use crate::http::{create_router, AppState};

/// Run the HTTP server until Ctrl-C.
pub async fn run(config: BriefConfig) -> Result<()> {
    info!("Starting brief server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.server.http_addr);
    info!(
        "Storage: {} in {:?}",
        config.storage.backend, config.storage.data_dir
    );

    let store = config.open_store()?;
    let stats = store.stats()?;
    info!(
        "Store loaded: {} briefs ({} saved)",
        stats.brief_count, stats.saved_count
    );

    let generator = config.generator(store)?;
    match generator.dispatch() {
        Some(Dispatch::Llm) => info!(
            "LLM: {} via {} (timeout {}s)",
            config.llm.model, config.llm.base_url, config.llm.timeout_secs
        ),
        Some(Dispatch::Mock) => warn!("{} not set, serving offline mock briefs", API_KEY_ENV),
        None => warn!(
            "{} not set and mock fallback disabled, generate requests will be refused",
            API_KEY_ENV
        ),
    }

    let app = create_router(AppState::new(generator));
    let listener = tokio::net::TcpListener::bind(config.server.http_addr).await?;
    info!("Brief server ready on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, terminating...");
}
