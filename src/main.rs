use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phishscan_core::{app_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = config.server.bind_address.clone();
    info!(
        "Starting phishscan-core on {} ({:?}, probes {})",
        addr,
        config.server.environment,
        if config.probes.enabled { "enabled" } else { "disabled" }
    );
    if config.classifier.endpoint_url.is_none() {
        info!("No MODEL_ENDPOINT_URL set; prediction routes will answer 503");
    }

    let state = AppState::from_config(config)?;
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
