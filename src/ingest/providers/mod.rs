// src/ingest/providers/mod.rs
pub mod kev;
pub mod nvd;
pub mod rss;

use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::types::{FeedFetcher, RawItem, Source, SourceKind};

/// Identifying header sent with every outbound feed request.
pub(crate) const CLIENT_USER_AGENT: &str =
    concat!("veille-import/", env!("CARGO_PKG_VERSION"));

/// Production fetcher: dispatches a source to its adapter over one shared
/// HTTP client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawItem>> {
        match source.kind {
            SourceKind::Rss => rss::fetch(&self.client, source).await,
            SourceKind::Api => match source.name.as_str() {
                nvd::SOURCE_NAME => nvd::fetch(&self.client, source).await,
                kev::SOURCE_NAME => kev::fetch(&self.client, source).await,
                other => {
                    // The registry may hold placeholder sources before an
                    // adapter exists; they contribute nothing and the run
                    // carries on.
                    tracing::debug!(source = other, "no api adapter registered");
                    Ok(Vec::new())
                }
            },
        }
    }
}
