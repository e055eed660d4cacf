// src/store/mod.rs
//! Storage-backend abstraction.
//!
//! The pipeline treats the hosted relational backend as an external
//! collaborator; everything it needs is the four operations below. The
//! [`rest`] implementation talks to a PostgREST-style API, [`memory`]
//! keeps everything in-process for local runs and tests.

pub mod memory;
pub mod rest;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ingest::types::{NewItem, Source};

#[async_trait]
pub trait Store: Send + Sync {
    /// All sources with the active flag set.
    async fn active_sources(&self) -> Result<Vec<Source>>;

    /// Point lookup by exact URL. URL equality is the entire dedup contract.
    async fn item_exists(&self, url: &str) -> Result<bool>;

    /// Batch-insert surviving items; returns the number of rows written.
    /// `imported_at` is stamped on the storage side.
    async fn insert_items(&self, items: &[NewItem]) -> Result<usize>;

    /// Advance a source's `last_sync`. Never moves the timestamp backwards.
    async fn mark_synced(&self, source_id: &str, ts: DateTime<Utc>) -> Result<()>;
}
