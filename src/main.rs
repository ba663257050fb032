//! Feed service entrypoint. Boots the Axum HTTP server, wiring provider
//! routes, shared state, and the Prometheus exporter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flashwire::api::{create_router, AppState};
use flashwire::config::Config;
use flashwire::metrics::Metrics;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flashwire=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::load();
    let metrics = Metrics::init();

    let state = AppState::from_config(&config)
        .map_err(|e| anyhow::anyhow!("building app state: {e}"))?;
    let router = create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, "feed service listening");
    axum::serve(listener, router).await?;
    Ok(())
}
