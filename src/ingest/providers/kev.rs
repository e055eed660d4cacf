// src/ingest/providers/kev.rs
//! Adapter for the CISA Known Exploited Vulnerabilities catalog (flat JSON
//! array). The catalog only grows, so the most recently added entries are
//! the interesting ones; inclusion itself means active exploitation, which
//! is what the severity hint encodes.

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::ingest::providers::CLIENT_USER_AGENT;
use crate::ingest::types::{Category, RawItem, Severity, Source};

/// Source Registry name this adapter answers to.
pub const SOURCE_NAME: &str = "CISA KEV";
pub const MAX_ITEMS: usize = 10;

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    vulnerabilities: Vec<KevEntry>,
}

#[derive(Debug, Deserialize)]
struct KevEntry {
    #[serde(rename = "cveID")]
    cve_id: String,
    #[serde(rename = "vulnerabilityName", default)]
    vulnerability_name: String,
    #[serde(rename = "shortDescription", default)]
    short_description: String,
    #[serde(default)]
    product: String,
    #[serde(rename = "vendorProject", default)]
    vendor_project: String,
    #[serde(rename = "requiredAction", default)]
    required_action: String,
    #[serde(rename = "dateAdded", default)]
    date_added: String,
}

pub async fn fetch(client: &reqwest::Client, source: &Source) -> Result<Vec<RawItem>> {
    let body = client
        .get(&source.url)
        .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
        .send()
        .await
        .with_context(|| format!("GET {}", source.url))?
        .error_for_status()
        .context("kev feed returned error status")?
        .text()
        .await
        .context("reading kev body")?;
    parse_catalog(&body)
}

/// Parse the catalog, newest additions first, capped at [`MAX_ITEMS`].
pub fn parse_catalog(json: &str) -> Result<Vec<RawItem>> {
    let t0 = std::time::Instant::now();
    let mut catalog: Catalog = serde_json::from_str(json).context("parsing kev catalog")?;

    // dateAdded is ISO (YYYY-MM-DD), so lexicographic order is date order.
    catalog
        .vulnerabilities
        .sort_by(|a, b| b.date_added.cmp(&a.date_added));

    let mut out = Vec::new();
    for entry in catalog.vulnerabilities.into_iter().take(MAX_ITEMS) {
        let title = if entry.vulnerability_name.is_empty() {
            format!("{} {} ({})", entry.vendor_project, entry.product, entry.cve_id)
        } else {
            entry.vulnerability_name
        };
        let summary = format!(
            "{} {}: {} Required action: {}",
            entry.vendor_project, entry.product, entry.short_description, entry.required_action
        );

        out.push(RawItem {
            title,
            // NVD detail page: stable per-item URL, and the same CVE seen
            // through the NVD source dedups naturally.
            url: format!("https://nvd.nist.gov/vuln/detail/{}", entry.cve_id),
            summary,
            published: Some(entry.date_added),
            category_hint: Some(Category::Exploits),
            severity_hint: Some(Severity::Critical),
            cve_hint: Some(entry.cve_id),
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_items_total").increment(out.len() as u64);
    Ok(out)
}
