// src/store/rest.rs
//! PostgREST-style store: the hosted backend exposes each table under
//! `/rest/v1/<table>` with filter predicates in the query string and the
//! service key in `apikey`/`Authorization` headers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::RequestBuilder;

use crate::ingest::types::{NewItem, Source};
use crate::store::Store;

const SOURCES_TABLE: &str = "veille_sources";
const ITEMS_TABLE: &str = "veille_items";

pub struct RestStore {
    base: String,
    service_key: String,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl Store for RestStore {
    async fn active_sources(&self) -> Result<Vec<Source>> {
        let sources = self
            .authed(self.client.get(self.table_url(SOURCES_TABLE)))
            .query(&[("select", "*"), ("active", "eq.true")])
            .send()
            .await
            .context("listing active sources")?
            .error_for_status()
            .context("sources query rejected")?
            .json::<Vec<Source>>()
            .await
            .context("decoding sources")?;
        Ok(sources)
    }

    async fn item_exists(&self, url: &str) -> Result<bool> {
        let rows = self
            .authed(self.client.get(self.table_url(ITEMS_TABLE)))
            .query(&[
                ("select", "url".to_string()),
                ("url", format!("eq.{url}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .context("checking item existence")?
            .error_for_status()
            .context("item lookup rejected")?
            .json::<Vec<serde_json::Value>>()
            .await
            .context("decoding item lookup")?;
        Ok(!rows.is_empty())
    }

    async fn insert_items(&self, items: &[NewItem]) -> Result<usize> {
        self.authed(self.client.post(self.table_url(ITEMS_TABLE)))
            .header("Prefer", "return=minimal")
            .json(items)
            .send()
            .await
            .context("inserting items")?
            .error_for_status()
            .context("item insert rejected")?;
        Ok(items.len())
    }

    async fn mark_synced(&self, source_id: &str, ts: DateTime<Utc>) -> Result<()> {
        self.authed(self.client.patch(self.table_url(SOURCES_TABLE)))
            .query(&[("id", format!("eq.{source_id}"))])
            .json(&serde_json::json!({ "last_sync": ts }))
            .send()
            .await
            .context("updating last_sync")?
            .error_for_status()
            .context("last_sync update rejected")?;
        Ok(())
    }
}
