// src/store/memory.rs
//! In-process store: backs local runs without a hosted backend and gives
//! tests a real `Store` with inspectable state.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ingest::types::{NewItem, Source};
use crate::store::Store;

/// One persisted row: the candidate plus the import stamp the persistence
/// layer owns.
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub item: NewItem,
    pub imported_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStore {
    sources: Mutex<Vec<Source>>,
    items: Mutex<Vec<StoredItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(sources: Vec<Source>) -> Self {
        Self {
            sources: Mutex::new(sources),
            items: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all persisted items.
    pub fn items(&self) -> Vec<StoredItem> {
        self.items.lock().expect("mutex poisoned").clone()
    }

    pub fn source(&self, id: &str) -> Option<Source> {
        self.sources
            .lock()
            .expect("mutex poisoned")
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn active_sources(&self) -> Result<Vec<Source>> {
        Ok(self
            .sources
            .lock()
            .expect("mutex poisoned")
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect())
    }

    async fn item_exists(&self, url: &str) -> Result<bool> {
        Ok(self
            .items
            .lock()
            .expect("mutex poisoned")
            .iter()
            .any(|row| row.item.url == url))
    }

    async fn insert_items(&self, items: &[NewItem]) -> Result<usize> {
        let mut rows = self.items.lock().expect("mutex poisoned");
        // Mirrors the backend's unique constraint on url.
        for item in items {
            if rows.iter().any(|row| row.item.url == item.url) {
                bail!("unique constraint violated on url: {}", item.url);
            }
        }
        let now = Utc::now();
        rows.extend(items.iter().map(|item| StoredItem {
            item: item.clone(),
            imported_at: now,
        }));
        Ok(items.len())
    }

    async fn mark_synced(&self, source_id: &str, ts: DateTime<Utc>) -> Result<()> {
        let mut sources = self.sources.lock().expect("mutex poisoned");
        let Some(source) = sources.iter_mut().find(|s| s.id == source_id) else {
            bail!("unknown source id: {source_id}");
        };
        if source.last_sync.map_or(true, |old| ts > old) {
            source.last_sync = Some(ts);
        }
        Ok(())
    }
}
