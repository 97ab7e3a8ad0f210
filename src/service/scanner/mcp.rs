use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::manifest::{fetch_manifest, has_non_empty, has_string, ManifestLookup};
use super::{found_status, Scanner, ScannerScope};
use crate::domain::{Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, ScanContext};
use crate::service::http::Fetcher;

pub const MCP_PATHS: [&str; 2] = ["/.well-known/mcp.json", "/mcp.json"];

/// Checks for a Model Context Protocol manifest agents can connect through.
pub struct McpScanner {
    fetcher: Fetcher,
}

impl McpScanner {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    pub fn validate(manifest: &Map<String, Value>) -> Vec<String> {
        let mut issues = Vec::new();
        if !has_string(manifest, "name") {
            issues.push("Missing name field".to_string());
        }
        if !has_string(manifest, "version") {
            issues.push("Missing version field".to_string());
        }
        let capabilities = ["tools", "resources", "prompts", "endpoint"];
        if !capabilities.iter().any(|key| has_non_empty(manifest, key)) {
            issues.push("No tools, resources, prompts or endpoint declared".to_string());
        }
        issues
    }
}

#[async_trait]
impl Scanner for McpScanner {
    fn name(&self) -> &str {
        "mcp"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Standards
    }

    fn description(&self) -> &str {
        "Checks for an MCP manifest exposing site capabilities to agents"
    }

    fn weight(&self) -> f64 {
        0.8
    }

    fn scope(&self) -> ScannerScope {
        ScannerScope::Site
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let recommendation =
            "Publish an MCP manifest at /.well-known/mcp.json listing the tools agents can call";

        let (mut evidence, manifest) = match fetch_manifest(&self.fetcher, ctx, &MCP_PATHS).await? {
            ManifestLookup::Missing(evidence) => {
                return Ok(self
                    .indicator(ctx, IndicatorStatus::Fail, 0.0, "No MCP manifest found")
                    .with_recommendation(recommendation)
                    .with_evidence(Evidence::Manifest(evidence)));
            }
            ManifestLookup::Invalid(evidence) => {
                return Ok(self
                    .indicator(ctx, IndicatorStatus::Warn, 0.5, "MCP manifest is not valid JSON")
                    .with_found(true, false)
                    .with_recommendation(format!("Fix the MCP manifest: {}", evidence.issues.join("; ")))
                    .with_evidence(Evidence::Manifest(evidence)));
            }
            ManifestLookup::Found(evidence, manifest) => (evidence, manifest),
        };

        evidence.issues = Self::validate(&manifest);
        let (status, score) = found_status(&evidence.issues);
        let message = if evidence.issues.is_empty() {
            "Valid MCP manifest found".to_string()
        } else {
            format!("MCP manifest found with {} issue(s)", evidence.issues.len())
        };

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_found(true, evidence.issues.is_empty());
        if !evidence.issues.is_empty() {
            result = result.with_recommendation(format!(
                "Complete the MCP manifest: {}",
                evidence.issues.join("; ")
            ));
        }
        Ok(result.with_evidence(Evidence::Manifest(evidence)))
    }
}
