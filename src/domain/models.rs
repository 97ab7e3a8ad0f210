//! Core entities shared by scanners, the registry and the aggregator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use super::evidence::Evidence;

// ====== Score ======

/// Wrapper type for scores, storing a raw 0.0-1.0 value and helpers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct Score(pub f64);

impl Score {
    /// Return the raw 0.0-1.0 value
    pub fn raw(&self) -> f64 {
        self.0
    }

    pub fn integer(&self) -> u8 {
        (self.0 * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

impl From<f64> for Score {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

// ====== Enums ======

/// Scanner-level category of a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCategory {
    Standards,
    Seo,
    StructuredData,
    Accessibility,
    Performance,
    Security,
}

impl IndicatorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorCategory::Standards => "standards",
            IndicatorCategory::Seo => "seo",
            IndicatorCategory::StructuredData => "structured_data",
            IndicatorCategory::Accessibility => "accessibility",
            IndicatorCategory::Performance => "performance",
            IndicatorCategory::Security => "security",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorStatus {
    Pass,
    Warn,
    Fail,
    NotApplicable,
}

impl IndicatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorStatus::Pass => "pass",
            IndicatorStatus::Warn => "warn",
            IndicatorStatus::Fail => "fail",
            IndicatorStatus::NotApplicable => "not_applicable",
        }
    }

    /// Score used when a result carries no usable numeric score.
    pub fn default_score(&self) -> f64 {
        match self {
            IndicatorStatus::Pass => 1.0,
            IndicatorStatus::Warn => 0.5,
            IndicatorStatus::Fail | IndicatorStatus::NotApplicable => 0.0,
        }
    }

    /// Higher is worse. Used to roll several results up into one status.
    pub fn severity(&self) -> u8 {
        match self {
            IndicatorStatus::NotApplicable => 0,
            IndicatorStatus::Pass => 1,
            IndicatorStatus::Warn => 2,
            IndicatorStatus::Fail => 3,
        }
    }
}

// ====== Scan input ======

/// Lightweight page facts supplied by the crawler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status_code: Option<u16>,
    pub load_time_ms: Option<f64>,
    pub word_count: Option<usize>,
}

/// Input to every scanner. Built per page, read-only to scanners.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub audit_id: String,
    pub site_url: Url,
    pub page_url: Option<Url>,
    pub page_html: Option<String>,
    pub page_metadata: PageMetadata,
    pub crawler_metadata: BTreeMap<String, serde_json::Value>,
}

impl ScanContext {
    pub fn new(audit_id: impl Into<String>, site_url: Url) -> Self {
        Self {
            audit_id: audit_id.into(),
            site_url,
            page_url: None,
            page_html: None,
            page_metadata: PageMetadata::default(),
            crawler_metadata: BTreeMap::new(),
        }
    }

    pub fn with_page(mut self, page_url: Url, html: Option<String>) -> Self {
        self.page_url = Some(page_url);
        self.page_html = html;
        self
    }

    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.page_metadata = metadata;
        self
    }

    pub fn with_crawler_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.crawler_metadata.insert(key.into(), value);
        self
    }

    /// HTML of the page, when the crawler supplied a non-blank document.
    pub fn html(&self) -> Option<&str> {
        self.page_html
            .as_deref()
            .filter(|html| !html.trim().is_empty())
    }

    /// The page under inspection, or the site root for site-level checks.
    pub fn target_url(&self) -> &Url {
        self.page_url.as_ref().unwrap_or(&self.site_url)
    }

    /// Resolve a well-known path (e.g. `/llms.txt`) against the site origin.
    pub fn well_known_url(&self, path: &str) -> Result<Url, url::ParseError> {
        let absolute = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        self.site_url.join(&absolute)
    }
}

// ====== Scan output ======

/// Normalized output of one scanner run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub indicator_name: String,
    pub category: IndicatorCategory,
    pub status: IndicatorStatus,
    /// Raw score on the scanner's own scale (`0..=max_score`).
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
    pub message: String,
    pub recommendation: Option<String>,
    pub evidence: Evidence,
    pub found: bool,
    pub is_valid: bool,
    pub page_url: Option<String>,
}

impl IndicatorResult {
    pub fn new(
        indicator_name: impl Into<String>,
        category: IndicatorCategory,
        weight: f64,
        status: IndicatorStatus,
        score: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            indicator_name: indicator_name.into(),
            category,
            status,
            score,
            max_score: 1.0,
            weight,
            message: message.into(),
            recommendation: None,
            evidence: Evidence::None,
            found: false,
            is_valid: false,
            page_url: None,
        }
    }

    /// Synthetic failure for a scanner that crashed.
    pub fn crashed(
        indicator_name: impl Into<String>,
        category: IndicatorCategory,
        weight: f64,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self::new(
            indicator_name,
            category,
            weight,
            IndicatorStatus::Fail,
            0.0,
            format!("Scanner failed: {}", error),
        )
        .with_evidence(Evidence::Failure { error })
    }

    pub fn not_applicable(
        indicator_name: impl Into<String>,
        category: IndicatorCategory,
        weight: f64,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            indicator_name,
            category,
            weight,
            IndicatorStatus::NotApplicable,
            0.0,
            message,
        )
    }

    pub fn with_max_score(mut self, max_score: f64) -> Self {
        self.max_score = max_score;
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_found(mut self, found: bool, is_valid: bool) -> Self {
        self.found = found;
        self.is_valid = is_valid;
        self
    }

    pub fn for_page(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }

    /// Score on the shared 0.0-1.0 scale.
    pub fn normalized_score(&self) -> f64 {
        if self.status == IndicatorStatus::NotApplicable {
            return 0.0;
        }
        if self.max_score > 0.0 && self.score.is_finite() {
            (self.score / self.max_score).clamp(0.0, 1.0)
        } else {
            self.status.default_score()
        }
    }
}

// ====== Site profiles ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteProfile {
    BlogContent,
    Ecommerce,
    SaasApp,
    KbSupport,
    GovNontransacting,
    Custom,
}

impl SiteProfile {
    pub const ALL: [SiteProfile; 6] = [
        SiteProfile::BlogContent,
        SiteProfile::Ecommerce,
        SiteProfile::SaasApp,
        SiteProfile::KbSupport,
        SiteProfile::GovNontransacting,
        SiteProfile::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteProfile::BlogContent => "blog_content",
            SiteProfile::Ecommerce => "ecommerce",
            SiteProfile::SaasApp => "saas_app",
            SiteProfile::KbSupport => "kb_support",
            SiteProfile::GovNontransacting => "gov_nontransacting",
            SiteProfile::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Declared,
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDetectionResult {
    pub profile: SiteProfile,
    /// Relative strength of evidence, not a calibrated probability.
    pub confidence: f64,
    pub method: DetectionMethod,
    pub signals: Vec<String>,
}

// ====== Applicability ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicabilityStatus {
    Required,
    Optional,
    NotApplicable,
}

impl ApplicabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicabilityStatus::Required => "required",
            ApplicabilityStatus::Optional => "optional",
            ApplicabilityStatus::NotApplicable => "not_applicable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    pub status: ApplicabilityStatus,
    pub reason: String,
    pub included_in_category_math: bool,
}

impl Applicability {
    pub fn new(status: ApplicabilityStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            included_in_category_math: status != ApplicabilityStatus::NotApplicable,
        }
    }
}

// ====== Report categories ======

/// Top-level report grouping that indicators roll up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Discovery,
    Understanding,
    Actions,
    Trust,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 4] = [
        ReportCategory::Discovery,
        ReportCategory::Understanding,
        ReportCategory::Actions,
        ReportCategory::Trust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Discovery => "discovery",
            ReportCategory::Understanding => "understanding",
            ReportCategory::Actions => "actions",
            ReportCategory::Trust => "trust",
        }
    }

    /// Fixed weight in the overall score. The four weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            ReportCategory::Discovery => 0.30,
            ReportCategory::Understanding => 0.30,
            ReportCategory::Actions => 0.25,
            ReportCategory::Trust => 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_integer_rounds_and_clamps() {
        assert_eq!(Score::from(0.874).integer(), 87);
        assert_eq!(Score::from(1.2).integer(), 100);
        assert_eq!(Score::from(-0.1).integer(), 0);
    }

    #[test]
    fn category_weights_sum_to_one() {
        let total: f64 = ReportCategory::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalized_score_uses_scanner_scale() {
        let result = IndicatorResult::new(
            "json_ld",
            IndicatorCategory::StructuredData,
            0.9,
            IndicatorStatus::Warn,
            5.0,
            "partial",
        )
        .with_max_score(10.0);
        assert_eq!(result.normalized_score(), 0.5);
    }

    #[test]
    fn normalized_score_falls_back_to_status() {
        let mut result = IndicatorResult::new(
            "custom",
            IndicatorCategory::Seo,
            1.0,
            IndicatorStatus::Warn,
            f64::NAN,
            "odd",
        );
        assert_eq!(result.normalized_score(), 0.5);

        result.status = IndicatorStatus::NotApplicable;
        result.score = 1.0;
        assert_eq!(result.normalized_score(), 0.0);
    }

    #[test]
    fn crashed_result_is_zero_score_failure() {
        let result = IndicatorResult::crashed("mcp", IndicatorCategory::Standards, 0.8, "boom");
        assert_eq!(result.status, IndicatorStatus::Fail);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.message, "Scanner failed: boom");
        assert_eq!(
            result.evidence,
            Evidence::Failure {
                error: "boom".into()
            }
        );
    }

    #[test]
    fn well_known_url_ignores_site_path() {
        let ctx = ScanContext::new("a1", Url::parse("https://example.com/shop/").unwrap());
        assert_eq!(
            ctx.well_known_url("llms.txt").unwrap().as_str(),
            "https://example.com/llms.txt"
        );
        assert_eq!(
            ctx.well_known_url("/.well-known/mcp.json").unwrap().as_str(),
            "https://example.com/.well-known/mcp.json"
        );
    }

    #[test]
    fn blank_html_counts_as_absent() {
        let ctx = ScanContext::new("a1", Url::parse("https://example.com").unwrap())
            .with_page(Url::parse("https://example.com/a").unwrap(), Some("  \n".into()));
        assert!(ctx.html().is_none());
    }
}
