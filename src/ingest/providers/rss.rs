// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::providers::CLIENT_USER_AGENT;
use crate::ingest::types::{RawItem, Source};

/// Bounded work per run: only the first items of a feed are considered,
/// however large the feed is.
pub const MAX_ITEMS: usize = 10;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

// <guid> may carry an isPermaLink attribute; only the text matters here.
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// GET the feed (config override first, source URL otherwise) and parse it.
pub async fn fetch(client: &reqwest::Client, source: &Source) -> Result<Vec<RawItem>> {
    let url = source.config.feed_url.as_deref().unwrap_or(&source.url);
    let body = client
        .get(url)
        .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("rss feed {url} returned error status"))?
        .text()
        .await
        .context("reading rss body")?;
    parse_feed(&body)
}

/// Parse RSS XML into raw entries, capped at [`MAX_ITEMS`]. Items without a
/// `<link>` fall back to `<guid>`; items with neither are skipped since the
/// URL is the dedup key.
pub fn parse_feed(xml: &str) -> Result<Vec<RawItem>> {
    let t0 = std::time::Instant::now();

    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let mut out = Vec::new();
    for it in rss.channel.item.into_iter().take(MAX_ITEMS) {
        let guid = it.guid.and_then(|g| g.value);
        let Some(url) = it
            .link
            .filter(|l| !l.trim().is_empty())
            .or_else(|| guid.filter(|g| !g.trim().is_empty()))
        else {
            continue;
        };
        out.push(RawItem {
            title: it.title.unwrap_or_default(),
            url,
            summary: it.description.unwrap_or_default(),
            published: it.pub_date,
            ..Default::default()
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_items_total").increment(out.len() as u64);
    Ok(out)
}

// Feeds routinely embed bare HTML entities that are not valid XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
