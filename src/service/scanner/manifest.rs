//! Shared lookup for JSON manifests published at well-known locations.

use serde_json::{Map, Value};

use crate::domain::{ManifestEvidence, ScanContext};
use crate::service::http::Fetcher;

pub(crate) enum ManifestLookup {
    /// None of the candidate locations served the manifest.
    Missing(ManifestEvidence),
    /// Found but not a JSON object.
    Invalid(ManifestEvidence),
    Found(ManifestEvidence, Map<String, Value>),
}

/// Try each candidate path in order and parse the first one that is served.
pub(crate) async fn fetch_manifest(
    fetcher: &Fetcher,
    ctx: &ScanContext,
    paths: &[&str],
) -> anyhow::Result<ManifestLookup> {
    let mut evidence = ManifestEvidence::default();
    let mut errors = Vec::new();

    for path in paths {
        let url = ctx.well_known_url(path)?;
        evidence.checked_urls.push(url.to_string());

        let fetched = fetcher.fetch(&url).await;
        let Some(body) = fetched.content.as_deref().filter(|_| fetched.found) else {
            errors.push(format!("{}: {}", url, fetched.error_text()));
            continue;
        };

        evidence.url = Some(url.to_string());
        return Ok(match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                evidence.fields = map.keys().cloned().collect();
                ManifestLookup::Found(evidence, map)
            }
            Ok(_) => {
                evidence
                    .issues
                    .push("Manifest is not a JSON object".to_string());
                ManifestLookup::Invalid(evidence)
            }
            Err(e) => {
                evidence.issues.push(format!("Invalid JSON: {}", e));
                ManifestLookup::Invalid(evidence)
            }
        });
    }

    evidence.error = Some(errors.join("; "));
    Ok(ManifestLookup::Missing(evidence))
}

pub(crate) fn has_string(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key)
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

pub(crate) fn has_non_empty(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        _ => false,
    }
}
