// src/ingest/classify.rs
//! Normalizer/classifier: turns one raw adapter entry into a candidate
//! item, or rejects it. HTML stripping, truncation, the keyword gate,
//! category/severity inference, CVE extraction, and publish-date parsing
//! all live here so every source type goes through the same path.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::{Category, NewItem, RawItem, Severity, Source};

pub const TITLE_MAX_CHARS: usize = 255;
pub const CONTENT_MAX_CHARS: usize = 500;
pub const EXCERPT_MAX_CHARS: usize = 200;

/// Ordered category rules; first match wins.
const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["cve-", "vulnerability", "vuln"], Category::Vulnerabilities),
    (&["exploit", "poc", "proof of concept"], Category::Exploits),
    (&["advisory", "security bulletin", "patch"], Category::Advisories),
    (&["malware", "ransomware", "threat"], Category::Malware),
    (&["aws", "azure", "cloud", "kubernetes"], Category::CloudInfra),
    (&["detection", "defense", "incident response"], Category::BlueTeam),
    (&["tool", "script", "automation"], Category::Tools),
];

/// Ordered severity rules; first match wins, no match leaves severity unset.
const SEVERITY_RULES: &[(&[&str], Severity)] = &[
    (&["critical", "zero-day", "0-day"], Severity::Critical),
    (&["high", "severe"], Severity::High),
    (&["medium", "moderate"], Severity::Medium),
    (&["low", "minor"], Severity::Low),
];

/// Decode HTML entities, strip markup, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Char-count truncation, safe on multi-byte boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

/// Case-insensitive substring scan; returns the configured keywords that
/// occur in the haystack, in configuration order.
pub fn match_keywords(haystack_lower: &str, keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|kw| !kw.trim().is_empty() && haystack_lower.contains(kw.to_lowercase().as_str()))
        .cloned()
        .collect()
}

pub fn infer_category(haystack_lower: &str) -> Category {
    for (needles, category) in CATEGORY_RULES {
        if needles.iter().any(|n| haystack_lower.contains(n)) {
            return *category;
        }
    }
    Category::LongRead
}

pub fn infer_severity(haystack_lower: &str) -> Option<Severity> {
    for (needles, severity) in SEVERITY_RULES {
        if needles.iter().any(|n| haystack_lower.contains(n)) {
            return Some(*severity);
        }
    }
    None
}

/// First CVE identifier in the text, uppercased.
pub fn extract_cve(text: &str) -> Option<String> {
    static RE_CVE: OnceCell<Regex> = OnceCell::new();
    let re = RE_CVE.get_or_init(|| Regex::new(r"(?i)CVE-\d{4}-\d{4,}").unwrap());
    re.find(text).map(|m| m.as_str().to_ascii_uppercase())
}

/// Parse the source-provided date string: RFC 2822 (RSS), RFC 3339, the
/// NVD offset-less timestamp, or a bare `YYYY-MM-DD` (KEV). Anything else
/// falls back to the ingestion time instead of rejecting the item.
pub fn parse_publish_date(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return fallback;
    };

    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc2822) {
        if let Some(utc) = DateTime::from_timestamp(dt.unix_timestamp(), 0) {
            return utc;
        }
    }
    // time's Rfc2822 parser rejects obsolete zone names like "GMT", which
    // real feeds still emit; chrono accepts them.
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return naive.and_utc();
        }
    }
    fallback
}

/// Run one raw entry through the full classification path. Returns `None`
/// when the candidate is rejected: no usable URL, or no keyword match.
pub fn build_item(source: &Source, raw: RawItem, now: DateTime<Utc>) -> Option<NewItem> {
    if raw.url.trim().is_empty() {
        return None;
    }

    let title = normalize_text(&raw.title);
    let body = normalize_text(&raw.summary);
    let haystack = format!("{title} {body}").to_lowercase();

    // Relevance gate: a candidate matching none of the source's keywords
    // never becomes an item.
    let keywords = match_keywords(&haystack, &source.keywords);
    if keywords.is_empty() {
        return None;
    }

    let category = raw
        .category_hint
        .unwrap_or_else(|| infer_category(&haystack));
    let severity = raw.severity_hint.or_else(|| infer_severity(&haystack));
    let cve_id = raw.cve_hint.or_else(|| extract_cve(&haystack));

    let content = (!body.is_empty()).then(|| truncate_chars(&body, CONTENT_MAX_CHARS));
    let excerpt = content
        .as_deref()
        .map(|c| truncate_chars(c, EXCERPT_MAX_CHARS));

    Some(NewItem {
        title: truncate_chars(&title, TITLE_MAX_CHARS),
        url: raw.url,
        content,
        excerpt,
        source_name: source.name.clone(),
        category,
        keywords,
        severity,
        cve_id,
        published_at: parse_publish_date(raw.published.as_deref(), now),
    })
}
