// src/ingest/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::ingest::types::FeedFetcher;
use crate::store::Store;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the background ticker driving the same import path as the HTTP
/// trigger. A failed run is logged and the loop keeps ticking.
pub fn spawn(
    cfg: SchedulerCfg,
    store: Arc<dyn Store>,
    fetcher: Arc<dyn FeedFetcher>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            match crate::ingest::run_import(store.as_ref(), fetcher.as_ref(), false).await {
                Ok(summary) => {
                    counter!("ingest_scheduled_runs_total").increment(1);
                    tracing::info!(
                        target: "ingest",
                        imported = summary.imported,
                        sources = summary.sources_processed,
                        "scheduled import tick"
                    );
                }
                Err(err) => {
                    tracing::warn!(target: "ingest", error = ?err, "scheduled import failed");
                }
            }
        }
    })
}
