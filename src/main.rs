//! veille-import — Binary Entrypoint
//! Boots the Axum HTTP server around the ingestion pipeline: store
//! selection, metrics recorder, optional background scheduler, routes.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use veille_import::api::{self, AppState};
use veille_import::config::{self, AppConfig};
use veille_import::ingest::providers::HttpFetcher;
use veille_import::ingest::scheduler::{self, SchedulerCfg};
use veille_import::ingest::types::FeedFetcher;
use veille_import::metrics::Metrics;
use veille_import::store::{memory::MemoryStore, rest::RestStore, Store};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("veille_import=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::from_env()?;

    let store: Arc<dyn Store> = match &cfg.backend {
        Some(backend) => Arc::new(RestStore::new(&backend.url, &backend.service_key)),
        None => {
            let sources = config::load_sources_from(&cfg.sources_path)?;
            tracing::info!(
                sources = sources.len(),
                path = %cfg.sources_path.display(),
                "no backend configured; using in-memory store"
            );
            Arc::new(MemoryStore::seeded(sources))
        }
    };
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFetcher::new());

    let metrics = Metrics::init(cfg.interval_secs);

    if let Some(interval_secs) = cfg.interval_secs {
        scheduler::spawn(SchedulerCfg { interval_secs }, store.clone(), fetcher.clone());
    }

    let app = api::router(AppState { store, fetcher }).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
