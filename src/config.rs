// src/config.rs
//! Runtime configuration from the environment, plus the local source
//! registry seed file used when no hosted backend is configured.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::ingest::types::Source;

pub const ENV_BACKEND_URL: &str = "VEILLE_BACKEND_URL";
pub const ENV_BACKEND_KEY: &str = "VEILLE_BACKEND_KEY";
pub const ENV_BIND_ADDR: &str = "VEILLE_BIND_ADDR";
pub const ENV_INTERVAL_SECS: &str = "VEILLE_INTERVAL_SECS";
pub const ENV_SOURCES_PATH: &str = "VEILLE_SOURCES_PATH";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Hosted backend; absent means the in-memory store seeded from
    /// `sources_path`.
    pub backend: Option<BackendConfig>,
    /// Background scheduler period; absent disables the scheduler.
    pub interval_secs: Option<u64>,
    pub sources_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var(ENV_BIND_ADDR)
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .with_context(|| format!("parsing {ENV_BIND_ADDR}"))?;

        let backend = match std::env::var(ENV_BACKEND_URL) {
            Ok(url) if !url.trim().is_empty() => {
                let service_key = std::env::var(ENV_BACKEND_KEY)
                    .map_err(|_| anyhow!("{ENV_BACKEND_KEY} required when {ENV_BACKEND_URL} is set"))?;
                Some(BackendConfig {
                    url: url.trim().to_string(),
                    service_key,
                })
            }
            _ => None,
        };

        let interval_secs = match std::env::var(ENV_INTERVAL_SECS) {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("parsing {ENV_INTERVAL_SECS}"))?;
                (secs > 0).then_some(secs)
            }
            Err(_) => None,
        };

        let sources_path = std::env::var(ENV_SOURCES_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOURCES_PATH));

        Ok(Self {
            bind_addr,
            backend,
            interval_secs,
            sources_path,
        })
    }
}

/// Load the seed registry from an explicit path. Supports TOML or JSON.
/// A missing file is an empty registry, not an error, so the service can
/// boot before any sources are configured.
pub fn load_sources_from(path: &Path) -> Result<Vec<Source>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<Source>> {
    // Try TOML first if hinted or the content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<Source>> {
    #[derive(serde::Deserialize)]
    struct SeedFile {
        sources: Vec<Source>,
    }
    let v: SeedFile = toml::from_str(s)?;
    Ok(clean_sources(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<Source>> {
    let v: Vec<Source> = serde_json::from_str(s)?;
    Ok(clean_sources(v))
}

/// Seed hygiene: drop entries without a URL, give id-less entries a stable
/// id derived from their name.
fn clean_sources(sources: Vec<Source>) -> Vec<Source> {
    sources
        .into_iter()
        .filter(|s| !s.url.trim().is_empty())
        .map(|mut s| {
            if s.id.trim().is_empty() {
                s.id = s.name.to_lowercase().replace(char::is_whitespace, "-");
            }
            s
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceKind;
    use std::{env, fs};

    #[test]
    fn toml_and_json_seeds_parse() {
        let toml = r#"
            [[sources]]
            name = "Test RSS"
            url = "https://feeds.example.test/rss"
            type = "rss"
            keywords = ["ransomware"]

            [[sources]]
            name = ""
            url = ""
            type = "rss"
        "#;
        let out = parse_toml(toml).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "test-rss");
        assert_eq!(out[0].kind, SourceKind::Rss);
        assert!(out[0].active);

        let json = r#"[
            {"name": "NVD CVE", "url": "https://services.nvd.nist.gov/rest/json/cves/2.0", "type": "api"}
        ]"#;
        let out = parse_json(json).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, SourceKind::Api);
    }

    #[test]
    fn missing_seed_file_is_empty_registry() {
        let v = load_sources_from(Path::new("does/not/exist.toml")).unwrap();
        assert!(v.is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn from_env_defaults_and_backend_pairing() {
        env::remove_var(ENV_BIND_ADDR);
        env::remove_var(ENV_BACKEND_URL);
        env::remove_var(ENV_BACKEND_KEY);
        env::remove_var(ENV_INTERVAL_SECS);
        env::remove_var(ENV_SOURCES_PATH);

        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.backend.is_none());
        assert!(cfg.interval_secs.is_none());
        assert_eq!(cfg.sources_path, PathBuf::from(DEFAULT_SOURCES_PATH));

        // URL without key is a configuration error, not a silent fallback.
        env::set_var(ENV_BACKEND_URL, "https://backend.example.test");
        assert!(AppConfig::from_env().is_err());
        env::set_var(ENV_BACKEND_KEY, "service-key");
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.backend.is_some());

        env::remove_var(ENV_BACKEND_URL);
        env::remove_var(ENV_BACKEND_KEY);
    }

    #[serial_test::serial]
    #[test]
    fn env_sources_path_is_honored() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.json");
        fs::write(
            &p,
            r#"[{"name": "X", "url": "https://x.test/feed", "type": "rss"}]"#,
        )
        .unwrap();

        env::set_var(ENV_SOURCES_PATH, p.display().to_string());
        let cfg = AppConfig::from_env().unwrap();
        let sources = load_sources_from(&cfg.sources_path).unwrap();
        assert_eq!(sources.len(), 1);
        env::remove_var(ENV_SOURCES_PATH);
    }
}
