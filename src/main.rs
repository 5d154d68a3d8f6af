//! quake-feed — Binary Entrypoint
//! Loads config, builds the adapters and the feed store, then serves the HTTP API.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quake_feed::api::{self, AppState};
use quake_feed::config::FeedConfig;
use quake_feed::metrics::Metrics;
use quake_feed::FeedStore;

/// Compact logs by default, JSON lines when FEED_LOG_JSON=1.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quake_feed=info,warn"));

    let json = std::env::var("FEED_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = FeedConfig::load_default().context("loading feed config")?;
    tracing::info!(
        bind = %cfg.bind_addr,
        observatory = %cfg.observatory.url,
        survey = %cfg.survey.url,
        "starting quake-feed"
    );

    let metrics = Metrics::init()?;
    let aggregator = quake_feed::aggregator_from_config(&cfg)?;
    let store = FeedStore::start(aggregator);

    let state = AppState {
        store,
        region_offset: cfg.region_offset(),
    };
    let app = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
