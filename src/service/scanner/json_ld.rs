use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use serde_json::{Map, Value};

use super::Scanner;
use crate::domain::{
    Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, JsonLdEvidence, ScanContext,
};
use crate::extractor::json_ld::{collect_types, entities, has_field, type_names};
use crate::extractor::PageExtractor;

/// schema.org types that carry meaning for AI agents.
pub const AI_RELEVANT_TYPES: [&str; 17] = [
    "Organization",
    "WebSite",
    "WebPage",
    "Article",
    "BlogPosting",
    "NewsArticle",
    "Product",
    "Offer",
    "FAQPage",
    "HowTo",
    "BreadcrumbList",
    "Person",
    "LocalBusiness",
    "Event",
    "Recipe",
    "SoftwareApplication",
    "Dataset",
];

pub const MAX_SCORE: f64 = 10.0;
const PASS_SCORE: f64 = 8.0;
const MAX_PENALTY: f64 = 4.0;

/// Scores the JSON-LD structured data embedded in a page.
pub struct JsonLdScanner;

impl JsonLdScanner {
    /// Analyze raw `<script type="application/ld+json">` bodies.
    /// Blocks that are not valid JSON are treated as absent.
    pub fn analyze_blocks(raw_blocks: &[String]) -> JsonLdEvidence {
        let blocks: Vec<Value> = raw_blocks
            .iter()
            .filter_map(|raw| match serde_json::from_str::<Value>(raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("[JSON-LD] Skipping invalid block: {}", e);
                    None
                }
            })
            .collect();

        let mut evidence = JsonLdEvidence {
            block_count: blocks.len(),
            ..Default::default()
        };

        for block in &blocks {
            collect_types(block, &mut evidence.schemas);
            validate_block(block, &mut evidence.issues);
        }

        for t in &evidence.schemas {
            if AI_RELEVANT_TYPES.iter().any(|relevant| t.contains(relevant))
                && !evidence.ai_relevant_types.contains(t)
            {
                evidence.ai_relevant_types.push(t.clone());
            }
        }

        let any = |pred: &dyn Fn(&str) -> bool| evidence.schemas.iter().any(|t| pred(t));
        let has_organization = any(&|t| t.contains("Organization") || t.contains("Corporation"));
        let has_website = any(&|t| t == "WebSite");
        let has_webpage = any(&|t| t.contains("WebPage"));
        let has_breadcrumb = any(&|t| t == "BreadcrumbList");
        let has_product = any(&|t| t == "Product");
        let has_article = any(&|t| t.contains("Article") || t == "BlogPosting");

        evidence.has_organization = has_organization;
        evidence.has_website = has_website;
        evidence.has_webpage = has_webpage;
        evidence.has_breadcrumb = has_breadcrumb;
        evidence.has_product = has_product;
        evidence.has_article = has_article;
        evidence
    }

    /// 0-10 score for found JSON-LD. Callers handle the nothing-found case.
    pub fn score(evidence: &JsonLdEvidence) -> f64 {
        let mut score = 5.0;
        if evidence.has_organization || evidence.has_website {
            score += 3.0;
        }
        if evidence.has_webpage || evidence.has_breadcrumb {
            score += 1.0;
        }
        if evidence.has_product || evidence.has_article {
            score += 2.0;
        }
        score += evidence.ai_relevant_types.len().min(3) as f64;
        if evidence.block_count > 1 {
            score += 1.0;
        }

        // Article metadata is commonly partial, so its issues cost half.
        let per_issue = if evidence.issues.iter().any(|i| i.contains("Article")) {
            0.5
        } else {
            1.0
        };
        score -= (evidence.issues.len() as f64 * per_issue).min(MAX_PENALTY);

        score.clamp(0.0, MAX_SCORE)
    }

    /// Found markup never fails, however weak; only its absence does.
    fn status_for(score: f64) -> IndicatorStatus {
        if score >= PASS_SCORE {
            IndicatorStatus::Pass
        } else {
            IndicatorStatus::Warn
        }
    }

    fn recommendation(evidence: &JsonLdEvidence) -> String {
        let mut advice = Vec::new();
        if !evidence.has_organization && !evidence.has_website {
            advice.push("Add Organization or WebSite schema".to_string());
        }
        if !evidence.has_webpage && !evidence.has_breadcrumb {
            advice.push("describe pages with WebPage or BreadcrumbList".to_string());
        }
        if !evidence.issues.is_empty() {
            advice.push(format!("fix {}", evidence.issues.join("; ")));
        }
        advice.join("; ")
    }
}

fn validate_block(block: &Value, issues: &mut Vec<String>) {
    let roots: Vec<&Map<String, Value>> = match block {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => vec![map],
        _ => Vec::new(),
    };

    for root in roots {
        match root.get("@context") {
            None => issues.push("Missing @context property".to_string()),
            Some(context) if !context.to_string().contains("schema.org") => {
                issues.push("@context does not reference schema.org".to_string())
            }
            Some(_) => {}
        }
    }

    for entity in entities(block) {
        validate_entity(entity, issues);
    }
}

fn validate_entity(entity: &Map<String, Value>, issues: &mut Vec<String>) {
    let types = entity.get("@type").map(type_names).unwrap_or_default();
    if types.is_empty() {
        issues.push("Missing @type property".to_string());
        return;
    }

    for t in types {
        let required: &[&str] = if t.contains("Organization") || t.contains("Corporation") {
            &["name", "url"]
        } else if t == "WebSite" {
            &["url", "name"]
        } else if t == "Product" {
            &["name", "description"]
        } else if t.contains("Article") || t == "BlogPosting" {
            &["headline", "author", "datePublished"]
        } else {
            &[]
        };

        for field in required {
            if !has_field(entity, field) {
                issues.push(format!("{} missing {} property", t, field));
            }
        }
    }
}

#[async_trait]
impl Scanner for JsonLdScanner {
    fn name(&self) -> &str {
        "json_ld"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::StructuredData
    }

    fn description(&self) -> &str {
        "Checks schema.org JSON-LD structured data on the page"
    }

    fn weight(&self) -> f64 {
        0.9
    }

    fn is_applicable(&self, ctx: &ScanContext) -> bool {
        ctx.html().is_some()
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let Some(html) = ctx.html() else {
            return Ok(self
                .indicator(ctx, IndicatorStatus::NotApplicable, 0.0, "No HTML to inspect")
                .with_max_score(MAX_SCORE));
        };

        let raw_blocks = PageExtractor::extract_json_ld_blocks(&Html::parse_document(html));
        let evidence = Self::analyze_blocks(&raw_blocks);

        if evidence.block_count == 0 {
            return Ok(self
                .indicator(ctx, IndicatorStatus::Fail, 0.0, "No JSON-LD structured data found")
                .with_max_score(MAX_SCORE)
                .with_recommendation(
                    "Add schema.org JSON-LD describing the organization, site and page content",
                )
                .with_evidence(Evidence::JsonLd(evidence)));
        }

        let score = Self::score(&evidence);
        let status = Self::status_for(score);
        let message = format!(
            "Found {} JSON-LD block(s) with {} schema type(s) and {} issue(s)",
            evidence.block_count,
            evidence.schemas.len(),
            evidence.issues.len()
        );

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_max_score(MAX_SCORE)
            .with_found(true, evidence.issues.is_empty());
        if status != IndicatorStatus::Pass {
            result = result.with_recommendation(Self::recommendation(&evidence));
        }
        Ok(result.with_evidence(Evidence::JsonLd(evidence)))
    }
}
