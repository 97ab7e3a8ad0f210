use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use url::Url;

use super::{found_status, Scanner};
use crate::domain::{
    CanonicalEvidence, Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, ScanContext,
};
use crate::extractor::PageExtractor;

/// Checks the page declares a single absolute canonical URL on its own host.
pub struct CanonicalScanner;

impl CanonicalScanner {
    pub fn inspect(canonicals: &[String], page_url: &Url) -> CanonicalEvidence {
        let mut evidence = CanonicalEvidence {
            tag_count: canonicals.len(),
            ..Default::default()
        };
        let Some(href) = canonicals.first() else {
            return evidence;
        };
        evidence.href = Some(href.clone());

        if canonicals.len() > 1 {
            evidence
                .issues
                .push(format!("Multiple canonical tags found ({})", canonicals.len()));
        }

        let resolved = if href.is_empty() {
            evidence.issues.push("Canonical href is empty".to_string());
            None
        } else {
            match Url::parse(href) {
                Ok(url) => Some(url),
                Err(url::ParseError::RelativeUrlWithoutBase) => {
                    evidence
                        .issues
                        .push("Canonical URL is relative".to_string());
                    page_url.join(href).ok()
                }
                Err(e) => {
                    evidence
                        .issues
                        .push(format!("Canonical URL could not be parsed: {}", e));
                    None
                }
            }
        };

        if let Some(resolved) = resolved {
            if resolved.host_str() != page_url.host_str() {
                evidence
                    .issues
                    .push("Canonical URL points to another host".to_string());
            }
            let mut page = page_url.clone();
            page.set_fragment(None);
            evidence.matches_page = resolved == page;
            evidence.resolved = Some(resolved.to_string());
        }

        evidence
    }
}

#[async_trait]
impl Scanner for CanonicalScanner {
    fn name(&self) -> &str {
        "canonical_urls"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Seo
    }

    fn description(&self) -> &str {
        "Checks the page declares a usable canonical URL"
    }

    fn weight(&self) -> f64 {
        0.5
    }

    fn is_applicable(&self, ctx: &ScanContext) -> bool {
        ctx.html().is_some()
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let Some(html) = ctx.html() else {
            return Ok(self.indicator(ctx, IndicatorStatus::NotApplicable, 0.0, "No HTML to inspect"));
        };

        let canonicals = PageExtractor::extract_canonicals(&Html::parse_document(html));
        let evidence = Self::inspect(&canonicals, ctx.target_url());

        if evidence.tag_count == 0 {
            return Ok(self
                .indicator(ctx, IndicatorStatus::Fail, 0.0, "No canonical URL specified")
                .with_recommendation(
                    "Add <link rel=\"canonical\"> with the absolute preferred URL of the page",
                )
                .with_evidence(Evidence::Canonical(evidence)));
        }

        let (status, score) = found_status(&evidence.issues);
        let message = match (&evidence.resolved, evidence.issues.is_empty()) {
            (Some(url), true) => format!("Canonical URL set to {}", url),
            _ => format!("Canonical URL has {} issue(s)", evidence.issues.len()),
        };

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_found(true, evidence.issues.is_empty());
        if !evidence.issues.is_empty() {
            result = result.with_recommendation(format!("Fix canonical tag: {}", evidence.issues.join("; ")));
        }
        Ok(result.with_evidence(Evidence::Canonical(evidence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::scanner::test_support::page_context;

    fn page(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn absolute_self_canonical_is_clean() {
        let evidence = CanonicalScanner::inspect(
            &["https://example.com/a".to_string()],
            &page("https://example.com/a#top"),
        );
        assert!(evidence.issues.is_empty());
        assert!(evidence.matches_page);
    }

    #[test]
    fn relative_and_duplicate_canonicals_are_flagged() {
        let evidence = CanonicalScanner::inspect(
            &["/a".to_string(), "/b".to_string()],
            &page("https://example.com/a"),
        );
        assert_eq!(
            evidence.issues,
            vec![
                "Multiple canonical tags found (2)".to_string(),
                "Canonical URL is relative".to_string()
            ]
        );
        assert_eq!(evidence.resolved.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn cross_host_canonical_is_flagged() {
        let evidence = CanonicalScanner::inspect(
            &["https://mirror.example.net/a".to_string()],
            &page("https://example.com/a"),
        );
        assert_eq!(
            evidence.issues,
            vec!["Canonical URL points to another host".to_string()]
        );
        assert!(!evidence.matches_page);
    }

    #[tokio::test]
    async fn scan_statuses() {
        let ok = page_context(
            "https://example.com/a",
            r#"<html><head><link rel="canonical" href="https://example.com/a"></head></html>"#,
        );
        let result = CanonicalScanner.scan(&ok).await.unwrap();
        assert_eq!(result.status, IndicatorStatus::Pass);

        let relative = page_context(
            "https://example.com/a",
            r#"<html><head><link rel="canonical" href="/a"></head></html>"#,
        );
        let result = CanonicalScanner.scan(&relative).await.unwrap();
        assert_eq!(result.status, IndicatorStatus::Warn);
        assert_eq!(result.score, 0.5);

        let missing = page_context("https://example.com/a", "<html><head></head></html>");
        let result = CanonicalScanner.scan(&missing).await.unwrap();
        assert_eq!(result.status, IndicatorStatus::Fail);
        assert_eq!(result.message, "No canonical URL specified");
    }
}
