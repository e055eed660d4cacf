// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured external feed to poll. Maintained by administrators;
/// the pipeline only ever advances `last_sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default, deserialize_with = "null_default")]
    pub config: SourceConfig,
    #[serde(default, deserialize_with = "null_default")]
    pub keywords: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

// Backend rows may hold SQL NULL where the seed file simply omits the key.
fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Api,
}

/// Free-form per-source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Overrides the source URL when the feed lives elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
}

/// Closed category set for persisted items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Vulnérabilités")]
    Vulnerabilities,
    #[serde(rename = "Exploits/PoC")]
    Exploits,
    #[serde(rename = "Advisories")]
    Advisories,
    #[serde(rename = "Malware/Threat")]
    Malware,
    #[serde(rename = "Cloud/Infra")]
    CloudInfra,
    #[serde(rename = "Blue Team")]
    BlueTeam,
    #[serde(rename = "Outils")]
    Tools,
    #[serde(rename = "Lecture longue")]
    LongRead,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vulnerabilities => "Vulnérabilités",
            Category::Exploits => "Exploits/PoC",
            Category::Advisories => "Advisories",
            Category::Malware => "Malware/Threat",
            Category::CloudInfra => "Cloud/Infra",
            Category::BlueTeam => "Blue Team",
            Category::Tools => "Outils",
            Category::LongRead => "Lecture longue",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// CVSS base-score bands as published by NVD.
    pub fn from_cvss(score: f64) -> Severity {
        if score >= 9.0 {
            Severity::Critical
        } else if score >= 7.0 {
            Severity::High
        } else if score >= 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Adapter output: one raw candidate entry in a shape every source type can
/// produce. Optional hints let API adapters carry fields their origin
/// already determines (NVD severity from CVSS, KEV category) past the
/// heuristic classification steps.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub title: String,
    pub url: String,
    /// Description-like body text; may still contain HTML markup.
    pub summary: String,
    /// Publish date as provided by the source, unparsed.
    pub published: Option<String>,
    pub category_hint: Option<Category>,
    pub severity_hint: Option<Severity>,
    pub cve_hint: Option<String>,
}

/// A fully classified candidate queued for insertion. `imported_at` is
/// stamped by the persistence layer; active/featured flags stay under
/// administrator control and are never written by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub source_name: String,
    pub category: Category,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve_id: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Outcome of one full ingestion cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub sources_processed: usize,
}

/// Transport seam between the orchestrator and the per-source adapters.
/// The production implementation dispatches on source type and name; tests
/// substitute fixture- or failure-backed fetchers.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawItem>>;
}
