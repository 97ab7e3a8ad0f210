use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::manifest::{fetch_manifest, has_non_empty, has_string, ManifestLookup};
use super::{found_status, Scanner, ScannerScope};
use crate::domain::{Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, ScanContext};
use crate::service::http::Fetcher;

pub const AGENTS_JSON_PATHS: [&str; 2] = ["/.well-known/agents.json", "/agents.json"];

/// Checks for an agents.json file describing agent flows.
pub struct AgentsJsonScanner {
    fetcher: Fetcher,
}

impl AgentsJsonScanner {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    pub fn validate(manifest: &Map<String, Value>) -> Vec<String> {
        let mut issues = Vec::new();
        let has_title = manifest
            .get("info")
            .and_then(Value::as_object)
            .map(|info| has_string(info, "title"))
            .unwrap_or(false);
        if !has_title {
            issues.push("Missing info.title".to_string());
        }
        if !has_non_empty(manifest, "flows") && !has_non_empty(manifest, "agents") {
            issues.push("No flows or agents declared".to_string());
        }
        issues
    }
}

#[async_trait]
impl Scanner for AgentsJsonScanner {
    fn name(&self) -> &str {
        "agents_json"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Standards
    }

    fn description(&self) -> &str {
        "Checks for an agents.json file describing the flows agents can run"
    }

    fn weight(&self) -> f64 {
        0.6
    }

    fn scope(&self) -> ScannerScope {
        ScannerScope::Site
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let (mut evidence, manifest) =
            match fetch_manifest(&self.fetcher, ctx, &AGENTS_JSON_PATHS).await? {
                ManifestLookup::Missing(evidence) => {
                    return Ok(self
                        .indicator(ctx, IndicatorStatus::Fail, 0.0, "No agents.json file found")
                        .with_recommendation(
                            "Publish /.well-known/agents.json describing the flows agents can run on the site",
                        )
                        .with_evidence(Evidence::Manifest(evidence)));
                }
                ManifestLookup::Invalid(evidence) => {
                    return Ok(self
                        .indicator(ctx, IndicatorStatus::Warn, 0.5, "agents.json is not valid JSON")
                        .with_found(true, false)
                        .with_recommendation(format!("Fix agents.json: {}", evidence.issues.join("; ")))
                        .with_evidence(Evidence::Manifest(evidence)));
                }
                ManifestLookup::Found(evidence, manifest) => (evidence, manifest),
            };

        evidence.issues = Self::validate(&manifest);
        let (status, score) = found_status(&evidence.issues);
        let message = if evidence.issues.is_empty() {
            "Valid agents.json found".to_string()
        } else {
            format!("agents.json found with {} issue(s)", evidence.issues.len())
        };

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_found(true, evidence.issues.is_empty());
        if !evidence.issues.is_empty() {
            result = result
                .with_recommendation(format!("Complete agents.json: {}", evidence.issues.join("; ")));
        }
        Ok(result.with_evidence(Evidence::Manifest(evidence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn complete_manifest_has_no_issues() {
        let manifest = as_map(json!({
            "info": { "title": "Shop agents", "version": "0.1" },
            "flows": [{ "id": "checkout" }]
        }));
        assert!(AgentsJsonScanner::validate(&manifest).is_empty());
    }

    #[test]
    fn agents_array_is_accepted_instead_of_flows() {
        let manifest = as_map(json!({ "info": { "title": "Docs" }, "agents": [{ "name": "helper" }] }));
        assert!(AgentsJsonScanner::validate(&manifest).is_empty());
    }

    #[test]
    fn empty_manifest_lists_both_issues() {
        let manifest = as_map(json!({ "info": {}, "flows": [] }));
        assert_eq!(
            AgentsJsonScanner::validate(&manifest),
            vec![
                "Missing info.title".to_string(),
                "No flows or agents declared".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn served_manifest_passes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/.well-known/agents.json")
            .with_status(200)
            .with_body(r#"{"info":{"title":"Shop"},"flows":[{"id":"buy"}]}"#)
            .create_async()
            .await;

        let result = AgentsJsonScanner::new(crate::service::scanner::test_support::fetcher())
            .scan(&crate::service::scanner::test_support::site_context(&server.url()))
            .await
            .unwrap();

        assert_eq!(result.status, IndicatorStatus::Pass);
        assert!(result.found && result.is_valid);
    }
}
