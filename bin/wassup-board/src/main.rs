//! # Wassup-Board Binary
//!
//! Assembles the server from configuration and compile-time store features.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wb_api::{create_router, AppState};
use wb_config::{LogFormat, LogSettings, Settings};
use wb_core::ThreadStore;
use wb_hub::Hub;

#[cfg(not(any(feature = "store-flatfile", feature = "store-memory")))]
compile_error!("enable one of the `store-flatfile` or `store-memory` features");

fn init_tracing(log: &LogSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log.filter.as_str().into());

    match log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}

#[cfg(feature = "store-flatfile")]
async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn ThreadStore>> {
    let store = wb_store_flatfile::FlatFileStore::open(&settings.store.path)
        .await
        .with_context(|| format!("failed to open thread store at {}", settings.store.path))?;
    Ok(Arc::new(store))
}

#[cfg(all(feature = "store-memory", not(feature = "store-flatfile")))]
async fn open_store(_settings: &Settings) -> anyhow::Result<Arc<dyn ThreadStore>> {
    Ok(Arc::new(wb_store_memory::MemoryStore::new()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.log);

    let store = open_store(&settings).await?;
    let hub = Hub::new(store, settings.hub.hub_config());
    hub.start_workers()?;

    let app = create_router(AppState::new(hub.clone(), settings.cors.allowed_origins.clone()));

    let addr = settings.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "wassup-board listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub.shutdown().await;
    Ok(())
}
