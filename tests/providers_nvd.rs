// tests/providers_nvd.rs
use std::fs;

use veille_import::ingest::providers::nvd;
use veille_import::{Category, Severity};

#[test]
fn nvd_envelope_maps_cvss_bands_and_hints() {
    let json = fs::read_to_string("tests/fixtures/nvd_cves.json")
        .expect("missing tests/fixtures/nvd_cves.json");

    let items = nvd::parse_envelope(&json).expect("nvd parse ok");
    assert_eq!(items.len(), 3);

    let crit = &items[0];
    assert_eq!(crit.cve_hint.as_deref(), Some("CVE-2024-11111"));
    assert_eq!(crit.severity_hint, Some(Severity::Critical));
    assert_eq!(crit.category_hint, Some(Category::Vulnerabilities));
    assert_eq!(crit.url, "https://nvd.nist.gov/vuln/detail/CVE-2024-11111");
    assert!(crit.title.starts_with("CVE-2024-11111: A remote code execution"));
    assert!(crit.summary.contains("ExampleServer"));
    assert_eq!(crit.published.as_deref(), Some("2024-05-13T10:15:08.163"));

    // v3.0 metrics are the fallback when v3.1 is absent.
    assert_eq!(items[1].severity_hint, Some(Severity::High));
    // No metrics at all: severity stays unset.
    assert_eq!(items[2].severity_hint, None);
}

#[test]
fn empty_envelope_yields_no_items() {
    let items = nvd::parse_envelope(r#"{"vulnerabilities": []}"#).expect("parse ok");
    assert!(items.is_empty());
}
