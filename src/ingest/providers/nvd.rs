// src/ingest/providers/nvd.rs
//! Adapter for the NVD CVE REST API (paginated JSON envelope with CVSS
//! metrics). Requests the trailing publication window and maps CVSS base
//! scores onto the severity bands NVD itself documents.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::ingest::providers::CLIENT_USER_AGENT;
use crate::ingest::types::{Category, RawItem, Severity, Source};

/// Source Registry name this adapter answers to.
pub const SOURCE_NAME: &str = "NVD CVE";
pub const MAX_RESULTS: usize = 20;
const PUBLISHED_WINDOW_DAYS: i64 = 7;
// NVD expects ISO-8601 with milliseconds and no offset.
const NVD_DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    vulnerabilities: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    cve: Cve,
}

#[derive(Debug, Deserialize)]
struct Cve {
    id: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    descriptions: Vec<Description>,
    #[serde(default)]
    metrics: Metrics,
}

#[derive(Debug, Deserialize)]
struct Description {
    lang: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct Metrics {
    #[serde(rename = "cvssMetricV31", default)]
    cvss_v31: Vec<CvssMetric>,
    #[serde(rename = "cvssMetricV30", default)]
    cvss_v30: Vec<CvssMetric>,
}

#[derive(Debug, Deserialize)]
struct CvssMetric {
    #[serde(rename = "cvssData")]
    cvss_data: CvssData,
}

#[derive(Debug, Deserialize)]
struct CvssData {
    #[serde(rename = "baseScore")]
    base_score: f64,
}

pub async fn fetch(client: &reqwest::Client, source: &Source) -> Result<Vec<RawItem>> {
    let end = Utc::now();
    let start = end - Duration::days(PUBLISHED_WINDOW_DAYS);

    let body = client
        .get(&source.url)
        .query(&[
            ("pubStartDate", start.format(NVD_DATE_FMT).to_string()),
            ("pubEndDate", end.format(NVD_DATE_FMT).to_string()),
            ("resultsPerPage", MAX_RESULTS.to_string()),
        ])
        .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
        .send()
        .await
        .with_context(|| format!("GET {}", source.url))?
        .error_for_status()
        .context("nvd api returned error status")?
        .text()
        .await
        .context("reading nvd body")?;
    parse_envelope(&body)
}

pub fn parse_envelope(json: &str) -> Result<Vec<RawItem>> {
    let t0 = std::time::Instant::now();
    let envelope: Envelope = serde_json::from_str(json).context("parsing nvd envelope")?;

    let mut out = Vec::with_capacity(envelope.vulnerabilities.len());
    for entry in envelope.vulnerabilities.into_iter().take(MAX_RESULTS) {
        let cve = entry.cve;
        let description = cve
            .descriptions
            .iter()
            .find(|d| d.lang == "en")
            .or_else(|| cve.descriptions.first())
            .map(|d| d.value.clone())
            .unwrap_or_default();

        let severity = cve
            .metrics
            .cvss_v31
            .first()
            .or_else(|| cve.metrics.cvss_v30.first())
            .map(|m| Severity::from_cvss(m.cvss_data.base_score));

        let title = if description.is_empty() {
            cve.id.clone()
        } else {
            format!("{}: {}", cve.id, description)
        };

        out.push(RawItem {
            title,
            url: format!("https://nvd.nist.gov/vuln/detail/{}", cve.id),
            summary: description,
            published: cve.published,
            category_hint: Some(Category::Vulnerabilities),
            severity_hint: severity,
            cve_hint: Some(cve.id),
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_items_total").increment(out.len() as u64);
    Ok(out)
}
