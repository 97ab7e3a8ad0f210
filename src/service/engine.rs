use futures::stream::{self, StreamExt};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use url::Url;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{IndicatorResult, PageMetadata, Report, ScanContext, SiteProfile};
use crate::error::{Result, ScanError};
use crate::extractor::PageExtractor;
use crate::service::aggregator::Aggregator;
use crate::service::registry::ScannerRegistry;
use crate::service::scanner::ScannerScope;

/// A page handed over by the crawler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInput {
    pub url: String,
    pub html: Option<String>,
    #[serde(default)]
    pub metadata: Option<PageMetadata>,
    #[serde(default)]
    pub crawler_metadata: BTreeMap<String, serde_json::Value>,
}

impl PageInput {
    pub fn new(url: impl Into<String>, html: Option<String>) -> Self {
        Self {
            url: url.into(),
            html,
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Runs the registry over a site and its pages, then aggregates.
pub struct AuditEngine {
    registry: Arc<ScannerRegistry>,
    aggregator: Aggregator,
    config: EngineConfig,
}

impl AuditEngine {
    pub fn new(registry: Arc<ScannerRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            aggregator: Aggregator::from_config(&config),
            config,
        }
    }

    /// Engine over the built-in scanners.
    pub fn with_default_scanners(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let registry = ScannerRegistry::with_default_scanners(&config)?;
        Ok(Self::new(Arc::new(registry), config))
    }

    pub fn registry(&self) -> &ScannerRegistry {
        &self.registry
    }

    /// Scan and score a site.
    pub async fn audit(
        &self,
        site_url: &str,
        pages: Vec<PageInput>,
        declared_profile: Option<SiteProfile>,
    ) -> Result<Report> {
        let site = parse_site_url(site_url)?;
        let audit_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        tracing::info!(
            "[ENGINE] Starting audit {} for {} ({} page(s))",
            audit_id,
            site,
            pages.len()
        );

        let contexts = build_page_contexts(&audit_id, &site, pages);
        let pages_scanned = contexts.len();
        let results = self.scan_contexts(&audit_id, &site, contexts).await;
        let report = self.aggregator.aggregate_audit(
            &audit_id,
            site.as_str(),
            &results,
            pages_scanned,
            declared_profile,
        );

        tracing::info!(
            "[ENGINE] Audit {} finished in {:.2}ms: {}/100",
            audit_id,
            start.elapsed().as_secs_f64() * 1000.0,
            report.overall.score100
        );
        Ok(report)
    }

    /// Run site-scope scanners once and page-scope scanners on every page.
    ///
    /// Results are keyed by page URL; site-scope results sit under the site URL.
    pub async fn scan_site(
        &self,
        audit_id: &str,
        site_url: &Url,
        pages: Vec<PageInput>,
    ) -> BTreeMap<String, Vec<IndicatorResult>> {
        let contexts = build_page_contexts(audit_id, site_url, pages);
        self.scan_contexts(audit_id, site_url, contexts).await
    }

    async fn scan_contexts(
        &self,
        audit_id: &str,
        site_url: &Url,
        contexts: Vec<ScanContext>,
    ) -> BTreeMap<String, Vec<IndicatorResult>> {
        let homepage_html = contexts
            .iter()
            .find(|ctx| ctx.page_url.as_ref().map(is_root_path).unwrap_or(false))
            .and_then(|ctx| ctx.page_html.clone());
        let site_ctx = ScanContext::new(audit_id, site_url.clone())
            .with_page(site_url.clone(), homepage_html);

        let mut results: BTreeMap<String, Vec<IndicatorResult>> = BTreeMap::new();
        let site_results = self.registry.run_by_scope(ScannerScope::Site, &site_ctx).await;
        tracing::debug!(
            "[ENGINE] {} site-level result(s) for {}",
            site_results.len(),
            site_url
        );
        results.insert(site_url.to_string(), site_results);

        let registry = &self.registry;
        let page_results: Vec<(String, Vec<IndicatorResult>)> = stream::iter(contexts)
            .map(|ctx| async move {
                let key = ctx.target_url().to_string();
                let found = registry.run_by_scope(ScannerScope::Page, &ctx).await;
                tracing::debug!("[ENGINE] {} page result(s) for {}", found.len(), key);
                (key, found)
            })
            .buffer_unordered(self.config.max_concurrent_pages.max(1))
            .collect()
            .await;

        for (key, found) in page_results {
            results.entry(key).or_default().extend(found);
        }
        results
    }
}

fn parse_site_url(site_url: &str) -> Result<Url> {
    let url = Url::parse(site_url.trim())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ScanError::InvalidUrl(format!(
            "{}: expected an http(s) URL with a host",
            site_url
        )));
    }
    Ok(url)
}

fn is_root_path(url: &Url) -> bool {
    url.path() == "/" && url.query().is_none()
}

/// One context per distinct, parsable page URL, in input order.
fn build_page_contexts(audit_id: &str, site_url: &Url, pages: Vec<PageInput>) -> Vec<ScanContext> {
    let mut seen = BTreeSet::new();
    let mut contexts = Vec::with_capacity(pages.len());

    for page in pages {
        let url = match site_url.join(page.url.trim()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("[ENGINE] Skipping page {:?}: {}", page.url, e);
                continue;
            }
        };
        if !seen.insert(url.to_string()) {
            continue;
        }

        let metadata = complete_metadata(page.metadata.unwrap_or_default(), page.html.as_deref());
        let mut ctx = ScanContext::new(audit_id, site_url.clone())
            .with_page(url, page.html)
            .with_metadata(metadata);
        for (key, value) in page.crawler_metadata {
            ctx = ctx.with_crawler_metadata(key, value);
        }
        contexts.push(ctx);
    }
    contexts
}

/// Fill metadata fields the crawler left empty from the HTML itself.
fn complete_metadata(mut metadata: PageMetadata, html: Option<&str>) -> PageMetadata {
    let Some(html) = html.filter(|h| !h.trim().is_empty()) else {
        return metadata;
    };
    if metadata.title.is_some() && metadata.description.is_some() && metadata.word_count.is_some() {
        return metadata;
    }

    let document = Html::parse_document(html);
    if metadata.title.is_none() {
        metadata.title = PageExtractor::extract_title(&document);
    }
    if metadata.description.is_none() {
        metadata.description = PageExtractor::extract_meta_description(&document);
    }
    if metadata.word_count.is_none() {
        metadata.word_count = Some(PageExtractor::extract_word_count(&document));
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndicatorCategory, IndicatorStatus};
    use crate::service::scanner::Scanner;
    use async_trait::async_trait;

    struct SiteCheck;

    #[async_trait]
    impl Scanner for SiteCheck {
        fn name(&self) -> &str {
            "site_check"
        }
        fn category(&self) -> IndicatorCategory {
            IndicatorCategory::Standards
        }
        fn description(&self) -> &str {
            "records whether homepage html was supplied"
        }
        fn scope(&self) -> ScannerScope {
            ScannerScope::Site
        }
        async fn scan(&self, ctx: &ScanContext) -> anyhow::Result<IndicatorResult> {
            let status = if ctx.html().is_some() {
                IndicatorStatus::Pass
            } else {
                IndicatorStatus::Warn
            };
            Ok(self.indicator(ctx, status, status.default_score(), "site"))
        }
    }

    struct TitleCheck;

    #[async_trait]
    impl Scanner for TitleCheck {
        fn name(&self) -> &str {
            "title_check"
        }
        fn category(&self) -> IndicatorCategory {
            IndicatorCategory::Seo
        }
        fn description(&self) -> &str {
            "passes when page metadata carries a title"
        }
        fn is_applicable(&self, ctx: &ScanContext) -> bool {
            ctx.html().is_some()
        }
        async fn scan(&self, ctx: &ScanContext) -> anyhow::Result<IndicatorResult> {
            let status = if ctx.page_metadata.title.is_some() {
                IndicatorStatus::Pass
            } else {
                IndicatorStatus::Fail
            };
            Ok(self.indicator(ctx, status, status.default_score(), "title"))
        }
    }

    fn engine() -> AuditEngine {
        let mut registry = ScannerRegistry::new();
        registry.register(Arc::new(SiteCheck)).unwrap();
        registry.register(Arc::new(TitleCheck)).unwrap();
        AuditEngine::new(Arc::new(registry), EngineConfig::default())
    }

    #[tokio::test]
    async fn site_scanners_run_once_and_page_scanners_per_page() {
        let site = Url::parse("https://example.com/").unwrap();
        let pages = vec![
            PageInput::new("https://example.com/", Some("<title>Home</title>".into())),
            PageInput::new("/about", Some("<title>About</title>".into())),
            PageInput::new("/blank", None),
        ];

        let results = engine().scan_site("a1", &site, pages).await;

        assert_eq!(results.len(), 3);
        let home = &results["https://example.com/"];
        let names: Vec<&str> = home.iter().map(|r| r.indicator_name.as_str()).collect();
        assert_eq!(names, vec!["site_check", "title_check"]);
        assert_eq!(home[0].status, IndicatorStatus::Pass);
        assert_eq!(results["https://example.com/about"].len(), 1);
        assert!(results["https://example.com/blank"].is_empty());
    }

    #[tokio::test]
    async fn site_scanner_sees_no_html_without_homepage() {
        let site = Url::parse("https://example.com/").unwrap();
        let results = engine().scan_site("a1", &site, Vec::new()).await;
        assert_eq!(results["https://example.com/"][0].status, IndicatorStatus::Warn);
    }

    #[tokio::test]
    async fn audit_rejects_invalid_site_url() {
        let err = engine().audit("not a url", Vec::new(), None).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));

        let err = engine()
            .audit("ftp://example.com", Vec::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn audit_produces_report() {
        let report = engine()
            .audit(
                "https://example.com",
                vec![PageInput::new("https://example.com/", Some("<title>Home</title>".into()))],
                Some(SiteProfile::Custom),
            )
            .await
            .unwrap();
        assert_eq!(report.site_url, "https://example.com/");
        assert_eq!(report.pages_scanned, 1);
        assert!(Uuid::parse_str(&report.audit_id).is_ok());
    }

    #[tokio::test]
    async fn pages_scanned_counts_only_supplied_pages() {
        let report = engine()
            .audit("https://example.com", Vec::new(), None)
            .await
            .unwrap();
        assert_eq!(report.pages_scanned, 0);

        let report = engine()
            .audit(
                "https://example.com",
                vec![
                    PageInput::new("/about", Some("<title>About</title>".into())),
                    PageInput::new("https://example.com/about", None),
                ],
                None,
            )
            .await
            .unwrap();
        assert_eq!(report.pages_scanned, 1);
    }

    #[test]
    fn metadata_is_derived_from_html() {
        let metadata = complete_metadata(
            PageMetadata {
                title: Some("Crawler title".into()),
                ..Default::default()
            },
            Some(r#"<title>Html title</title><meta name="description" content="About us"><body>one two three</body>"#),
        );
        assert_eq!(metadata.title.as_deref(), Some("Crawler title"));
        assert_eq!(metadata.description.as_deref(), Some("About us"));
        assert_eq!(metadata.word_count, Some(3));
    }

    #[test]
    fn duplicate_and_unparsable_pages_are_dropped() {
        let site = Url::parse("https://example.com/").unwrap();
        let contexts = build_page_contexts(
            "a1",
            &site,
            vec![
                PageInput::new("/a", None),
                PageInput::new("https://example.com/a", None),
                PageInput::new("https://[bad", None),
            ],
        );
        assert_eq!(contexts.len(), 1);
    }
}
