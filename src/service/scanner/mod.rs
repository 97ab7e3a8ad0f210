//! Scanners: independent checks that each inspect one AI-readiness signal.
//!
//! Every scanner implements [`Scanner`]. Site-scope scanners fetch a
//! well-known file once per audit; page-scope scanners inspect the HTML of
//! every page the crawler supplied.
//!
//! Expected misses (file not found, no markup) are reported as `fail`
//! results. `scan` returns `Err` only for unexpected faults, which the
//! registry turns into a synthetic failure.

mod agents_json;
mod basic_seo;
mod canonical;
mod json_ld;
mod llms_txt;
mod manifest;
mod mcp;
mod robots_txt;
mod sitemap;

pub use agents_json::AgentsJsonScanner;
pub use basic_seo::BasicSeoScanner;
pub use canonical::CanonicalScanner;
pub use json_ld::{JsonLdScanner, AI_RELEVANT_TYPES};
pub use llms_txt::{parse_llms_txt, LlmsTxtScanner};
pub use mcp::McpScanner;
pub use robots_txt::{RobotsTxtScanner, AI_CRAWLERS};
pub use sitemap::SitemapScanner;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::{IndicatorCategory, IndicatorResult, IndicatorStatus, ScanContext};
use crate::service::http::Fetcher;

/// Where a scanner looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerScope {
    /// A well-known file, checked once per audit.
    Site,
    /// The HTML of each page.
    #[default]
    Page,
}

/// Capability contract shared by all scanners.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Stable indicator key, e.g. `llms_txt`.
    fn name(&self) -> &str;

    fn category(&self) -> IndicatorCategory;

    fn description(&self) -> &str;

    /// Relative importance of the indicator.
    fn weight(&self) -> f64 {
        1.0
    }

    fn scope(&self) -> ScannerScope {
        ScannerScope::Page
    }

    /// Whether the scanner has anything to inspect in `ctx`.
    fn is_applicable(&self, _ctx: &ScanContext) -> bool {
        true
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult>;

    /// Start a result carrying this scanner's identity.
    fn indicator(
        &self,
        ctx: &ScanContext,
        status: IndicatorStatus,
        score: f64,
        message: impl Into<String>,
    ) -> IndicatorResult
    where
        Self: Sized,
    {
        IndicatorResult::new(
            self.name(),
            self.category(),
            self.weight(),
            status,
            score,
            message,
        )
        .for_page(ctx.target_url().as_str())
    }
}

/// The built-in scanner set, sharing one fetcher.
pub fn default_scanners(fetcher: Fetcher) -> Vec<Arc<dyn Scanner>> {
    vec![
        Arc::new(LlmsTxtScanner::new(fetcher.clone())),
        Arc::new(RobotsTxtScanner::new(fetcher.clone())),
        Arc::new(SitemapScanner::new(fetcher.clone())),
        Arc::new(McpScanner::new(fetcher.clone())),
        Arc::new(AgentsJsonScanner::new(fetcher)),
        Arc::new(JsonLdScanner),
        Arc::new(CanonicalScanner),
        Arc::new(BasicSeoScanner),
    ]
}

/// Status for content that was found: clean is a pass, anything else a warning.
pub(crate) fn found_status(issues: &[String]) -> (IndicatorStatus, f64) {
    if issues.is_empty() {
        (IndicatorStatus::Pass, 1.0)
    } else {
        (IndicatorStatus::Warn, 0.5)
    }
}
