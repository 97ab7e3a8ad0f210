//! Typed evidence attached to indicator results, one variant per scanner family.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    #[default]
    None,
    LlmsTxt(LlmsTxtEvidence),
    RobotsTxt(RobotsTxtEvidence),
    JsonLd(JsonLdEvidence),
    Sitemap(SitemapEvidence),
    Manifest(ManifestEvidence),
    Canonical(CanonicalEvidence),
    BasicSeo(BasicSeoEvidence),
    Failure { error: String },
    /// Scanner-specific data without a dedicated variant.
    Other(serde_json::Map<String, serde_json::Value>),
}

impl Evidence {
    /// Validation issues recorded by the scanner, if it records any.
    pub fn issues(&self) -> &[String] {
        match self {
            Evidence::LlmsTxt(e) => &e.issues,
            Evidence::RobotsTxt(e) => &e.issues,
            Evidence::JsonLd(e) => &e.issues,
            Evidence::Sitemap(e) => &e.issues,
            Evidence::Manifest(e) => &e.issues,
            Evidence::Canonical(e) => &e.issues,
            _ => &[],
        }
    }

    pub fn json_ld(&self) -> Option<&JsonLdEvidence> {
        match self {
            Evidence::JsonLd(e) => Some(e),
            _ => None,
        }
    }
}

/// Rules collected for one user agent in an llms.txt file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentRules {
    pub disallow: Vec<String>,
    pub allow: Vec<String>,
    pub crawl_delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmsTxtDocument {
    /// Last `User-agent` value seen, if any.
    pub user_agent: Option<String>,
    pub agents: BTreeMap<String, AgentRules>,
    /// Any other `key: value` directives, keyed by lowercased key.
    pub directives: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmsTxtEvidence {
    pub url: String,
    pub content: Option<LlmsTxtDocument>,
    pub issues: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotsTxtEvidence {
    pub url: String,
    pub blocked_ai_crawlers: Vec<String>,
    pub allowed_ai_crawlers: Vec<String>,
    pub sitemaps: Vec<String>,
    pub issues: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JsonLdEvidence {
    pub block_count: usize,
    /// Every distinct `@type` observed, in first-seen order.
    pub schemas: Vec<String>,
    pub ai_relevant_types: Vec<String>,
    pub has_organization: bool,
    pub has_website: bool,
    pub has_webpage: bool,
    pub has_breadcrumb: bool,
    pub has_product: bool,
    pub has_article: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SitemapEvidence {
    pub url: String,
    pub url_count: usize,
    pub is_index: bool,
    pub lastmod_count: usize,
    pub issues: Vec<String>,
    pub error: Option<String>,
}

/// Evidence for JSON manifests served from well-known locations (MCP, agents.json).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManifestEvidence {
    pub url: Option<String>,
    pub checked_urls: Vec<String>,
    /// Top-level keys present in the manifest.
    pub fields: Vec<String>,
    pub issues: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalEvidence {
    pub href: Option<String>,
    pub resolved: Option<String>,
    pub matches_page: bool,
    pub tag_count: usize,
    pub issues: Vec<String>,
}

/// Individual sub-check of the basic SEO scanner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeoCheck {
    pub key: String,
    pub passed: bool,
    pub score: f64,
    pub value: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicSeoEvidence {
    pub checks: Vec<SeoCheck>,
}
