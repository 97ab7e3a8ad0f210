use anyhow::Result;
use async_trait::async_trait;

use super::{found_status, Scanner, ScannerScope};
use crate::domain::{
    Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, ScanContext, SitemapEvidence,
};
use crate::extractor::sitemap::{parse_sitemap, SITE_MAP_PATH};
use crate::service::http::Fetcher;

/// Checks `/sitemap.xml` is served and lists URLs.
pub struct SitemapScanner {
    fetcher: Fetcher,
}

impl SitemapScanner {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    fn issues_for(body: &str) -> SitemapEvidence {
        let doc = parse_sitemap(body);
        let mut issues = Vec::new();

        if let Some(err) = &doc.parse_error {
            issues.push(format!("Sitemap XML could not be parsed: {}", err));
        }
        if !doc.has_valid_root() {
            issues.push("Sitemap is not a valid XML sitemap".to_string());
        }
        if doc.urls.is_empty() {
            issues.push("Sitemap contains no URLs".to_string());
        }

        SitemapEvidence {
            url: String::new(),
            url_count: doc.urls.len(),
            is_index: doc.is_index(),
            lastmod_count: doc.lastmod_count,
            issues,
            error: None,
        }
    }
}

#[async_trait]
impl Scanner for SitemapScanner {
    fn name(&self) -> &str {
        "sitemap_xml"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Seo
    }

    fn description(&self) -> &str {
        "Checks that sitemap.xml is served and lists the site's URLs"
    }

    fn weight(&self) -> f64 {
        0.7
    }

    fn scope(&self) -> ScannerScope {
        ScannerScope::Site
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let url = ctx.well_known_url(SITE_MAP_PATH)?;
        let fetched = self.fetcher.fetch(&url).await;

        let Some(body) = fetched.content.as_deref().filter(|_| fetched.found) else {
            return Ok(self
                .indicator(ctx, IndicatorStatus::Fail, 0.0, "No sitemap.xml found")
                .with_recommendation("Publish a sitemap.xml listing the pages agents should index")
                .with_evidence(Evidence::Sitemap(SitemapEvidence {
                    url: url.to_string(),
                    error: Some(fetched.error_text()),
                    ..Default::default()
                })));
        };

        let mut evidence = Self::issues_for(body);
        evidence.url = url.to_string();

        let (status, score) = found_status(&evidence.issues);
        let message = if evidence.issues.is_empty() {
            format!(
                "Sitemap{} lists {} URL(s)",
                if evidence.is_index { " index" } else { "" },
                evidence.url_count
            )
        } else {
            format!("Sitemap found with {} issue(s)", evidence.issues.len())
        };

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_found(true, evidence.issues.is_empty());
        if !evidence.issues.is_empty() {
            result = result.with_recommendation(format!("Fix sitemap.xml: {}", evidence.issues.join("; ")));
        }
        Ok(result.with_evidence(Evidence::Sitemap(evidence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::scanner::test_support::{fetcher, site_context};

    async fn scan_body(status: usize, body: &str) -> IndicatorResult {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/sitemap.xml")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        SitemapScanner::new(fetcher())
            .scan(&site_context(&server.url()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn urlset_passes() {
        let result = scan_body(
            200,
            r#"<?xml version="1.0"?><urlset><url><loc>https://example.com/</loc><lastmod>2024-05-01</lastmod></url><url><loc>https://example.com/about</loc></url></urlset>"#,
        )
        .await;

        assert_eq!(result.status, IndicatorStatus::Pass);
        assert_eq!(result.message, "Sitemap lists 2 URL(s)");
        match &result.evidence {
            Evidence::Sitemap(e) => {
                assert_eq!(e.url_count, 2);
                assert_eq!(e.lastmod_count, 1);
                assert!(!e.is_index);
            }
            other => panic!("unexpected evidence: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_urlset_warns() {
        let result = scan_body(200, "<urlset></urlset>").await;
        assert_eq!(result.status, IndicatorStatus::Warn);
        assert_eq!(
            result.evidence.issues(),
            ["Sitemap contains no URLs".to_string()]
        );
    }

    #[tokio::test]
    async fn self_closing_urlset_only_reports_missing_urls() {
        let result = scan_body(
            200,
            r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"/>"#,
        )
        .await;
        assert_eq!(result.status, IndicatorStatus::Warn);
        assert_eq!(
            result.evidence.issues(),
            ["Sitemap contains no URLs".to_string()]
        );
    }

    #[tokio::test]
    async fn html_page_served_as_sitemap_warns() {
        let result = scan_body(200, "<html><body>Home</body></html>").await;
        assert_eq!(result.status, IndicatorStatus::Warn);
        assert!(result
            .evidence
            .issues()
            .contains(&"Sitemap is not a valid XML sitemap".to_string()));
    }

    #[tokio::test]
    async fn missing_sitemap_fails() {
        let result = scan_body(404, "").await;
        assert_eq!(result.status, IndicatorStatus::Fail);
        assert_eq!(result.score, 0.0);
    }
}
