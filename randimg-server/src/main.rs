//! Randimg Server - REST API for collecting random images
//!
//! - POST /image - Store a new random image from Giphy
//! - GET /images - List stored images
//! - GET /image/{id} - Stream the content of a stored image

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use randimg_core::{GiphyClient, MockImageSource, RandomImageSource};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use randimg_server::{create_router_with_config, open_store, AppState, Config};

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("randimg_server=info,randimg_core=info,tower_http=info"));

    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

fn image_source(config: &Config) -> anyhow::Result<Arc<dyn RandomImageSource>> {
    if config.mock_source {
        tracing::warn!("Image source: mock (RANDIMG_MOCK_SOURCE is set)");
        return Ok(Arc::new(MockImageSource::default()));
    }

    let giphy = config.giphy();
    tracing::info!(url = %giphy.random_image_url(), "Image source: Giphy");

    let client = GiphyClient::with_config(giphy).context("Failed to build Giphy client")?;
    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        production = config.production,
        "Starting randimg-server"
    );

    let source = image_source(&config)?;
    let store = open_store(&config)
        .await
        .context("Failed to open image store")?;
    tracing::info!(persistent = store.is_persistent(), "Image store ready");

    let state = AppState::new(&config, source, store);
    let _sweeper = state.cache.spawn_sweeper(config.cache_check_period());

    let app = create_router_with_config(state, &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}
