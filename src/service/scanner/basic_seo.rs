use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;

use super::Scanner;
use crate::domain::{
    BasicSeoEvidence, Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, ScanContext,
    SeoCheck,
};
use crate::extractor::PageExtractor;

/// On-page SEO basics that also help agents read the page.
pub struct BasicSeoScanner;

fn check(
    key: &str,
    passed: bool,
    score: f64,
    value: Option<String>,
    description: impl Into<String>,
) -> SeoCheck {
    SeoCheck {
        key: key.to_string(),
        passed,
        score,
        value,
        description: Some(description.into()),
    }
}

impl BasicSeoScanner {
    pub fn analyze(html: &Html) -> BasicSeoEvidence {
        BasicSeoEvidence {
            checks: vec![
                Self::check_title(html),
                Self::check_meta_description(html),
                Self::check_viewport(html),
                Self::check_h1(html),
                Self::check_lang(html),
                Self::check_image_alt(html),
            ],
        }
    }

    fn check_title(html: &Html) -> SeoCheck {
        match PageExtractor::extract_title(html) {
            Some(t) => {
                let len = t.chars().count();
                let (passed, score, desc) = if len < 30 {
                    (false, 0.5, format!("Title too short ({} chars, recommend 30-60)", len))
                } else if len > 60 {
                    (false, 0.7, format!("Title too long ({} chars, recommend 30-60)", len))
                } else {
                    (true, 1.0, format!("Title length is good ({} chars)", len))
                };
                check("title", passed, score, Some(t), desc)
            }
            None => check("title", false, 0.0, None, "Missing document title"),
        }
    }

    fn check_meta_description(html: &Html) -> SeoCheck {
        match PageExtractor::extract_meta_description(html) {
            Some(d) => {
                let len = d.chars().count();
                let (passed, score, desc) = if len < 70 {
                    (false, 0.5, format!("Description too short ({} chars, recommend 70-160)", len))
                } else if len > 160 {
                    (false, 0.7, format!("Description too long ({} chars, recommend 70-160)", len))
                } else {
                    (true, 1.0, format!("Description length is good ({} chars)", len))
                };
                check("meta_description", passed, score, Some(d), desc)
            }
            None => check("meta_description", false, 0.0, None, "Missing meta description"),
        }
    }

    fn check_viewport(html: &Html) -> SeoCheck {
        match PageExtractor::extract_meta_content(html, "viewport") {
            Some(v) if v.contains("width=device-width") => {
                check("viewport", true, 1.0, Some(v), "Viewport is properly configured")
            }
            Some(v) => check("viewport", false, 0.5, Some(v), "Viewport missing width=device-width"),
            None => check("viewport", false, 0.0, None, "Missing viewport meta tag"),
        }
    }

    fn check_h1(html: &Html) -> SeoCheck {
        let count = PageExtractor::count_h1(html);
        let value = Some(count.to_string());
        match count {
            0 => check("h1", false, 0.0, value, "No h1 heading found"),
            1 => check("h1", true, 1.0, value, "Page has a single h1"),
            n => check("h1", false, 0.5, value, format!("Page has {} h1 headings", n)),
        }
    }

    fn check_lang(html: &Html) -> SeoCheck {
        match PageExtractor::extract_lang(html) {
            Some(lang) => check("lang", true, 1.0, Some(lang), "Document language declared"),
            None => check("lang", false, 0.0, None, "Missing lang attribute on <html>"),
        }
    }

    fn check_image_alt(html: &Html) -> SeoCheck {
        let stats = PageExtractor::image_alt_stats(html);
        if stats.total == 0 {
            return check(
                "image_alt",
                true,
                1.0,
                Some("0 images".to_string()),
                "No images found on page",
            );
        }

        let with_alt = stats.total - stats.missing_alt;
        let desc = if stats.missing_alt > 0 {
            format!("{} images missing alt attribute", stats.missing_alt)
        } else {
            "All images have alt attributes".to_string()
        };
        check(
            "image_alt",
            stats.missing_alt == 0,
            with_alt as f64 / stats.total as f64,
            Some(format!("{}/{} with alt", with_alt, stats.total)),
            desc,
        )
    }
}

#[async_trait]
impl Scanner for BasicSeoScanner {
    fn name(&self) -> &str {
        "basic_seo"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Seo
    }

    fn description(&self) -> &str {
        "Checks title, description, viewport, headings, language and image alt text"
    }

    fn weight(&self) -> f64 {
        0.6
    }

    fn is_applicable(&self, ctx: &ScanContext) -> bool {
        ctx.html().is_some()
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let Some(html) = ctx.html() else {
            return Ok(self.indicator(ctx, IndicatorStatus::NotApplicable, 0.0, "No HTML to inspect"));
        };

        let evidence = Self::analyze(&Html::parse_document(html));
        let total = evidence.checks.len().max(1) as f64;
        let score = evidence.checks.iter().map(|c| c.score).sum::<f64>() / total;
        let failing: Vec<&SeoCheck> = evidence.checks.iter().filter(|c| !c.passed).collect();

        let status = if score >= 0.8 {
            IndicatorStatus::Pass
        } else if score >= 0.4 {
            IndicatorStatus::Warn
        } else {
            IndicatorStatus::Fail
        };

        let message = format!(
            "{}/{} basic SEO checks passed",
            evidence.checks.len() - failing.len(),
            evidence.checks.len()
        );

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_found(true, failing.is_empty());
        if !failing.is_empty() {
            let fixes: Vec<&str> = failing
                .iter()
                .filter_map(|c| c.description.as_deref())
                .collect();
            result = result.with_recommendation(format!("Fix on-page basics: {}", fixes.join("; ")));
        }
        Ok(result.with_evidence(Evidence::BasicSeo(evidence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::scanner::test_support::page_context;

    const GOOD_PAGE: &str = r#"<html lang="en"><head>
        <title>Acme widgets for every workshop and hobby</title>
        <meta name="description" content="Acme makes sturdy widgets for workshops, hobbyists and makers, shipped worldwide within two days.">
        <meta name="viewport" content="width=device-width, initial-scale=1">
        </head><body><h1>Widgets</h1><img src="a.png" alt="A widget"></body></html>"#;

    fn check_for<'a>(evidence: &'a BasicSeoEvidence, key: &str) -> &'a SeoCheck {
        evidence.checks.iter().find(|c| c.key == key).unwrap()
    }

    #[test]
    fn title_length_scoring() {
        let short = Html::parse_document("<title>Short</title>");
        assert_eq!(BasicSeoScanner::check_title(&short).score, 0.5);

        let long = Html::parse_document(&format!("<title>{}</title>", "x".repeat(70)));
        assert_eq!(BasicSeoScanner::check_title(&long).score, 0.7);

        let missing = Html::parse_document("<html></html>");
        assert_eq!(BasicSeoScanner::check_title(&missing).score, 0.0);
    }

    #[test]
    fn viewport_without_device_width_is_partial() {
        let doc = Html::parse_document(r#"<meta name="viewport" content="initial-scale=1">"#);
        let result = BasicSeoScanner::check_viewport(&doc);
        assert!(!result.passed);
        assert_eq!(result.score, 0.5);
    }

    #[test]
    fn multiple_h1_and_missing_alt_are_flagged() {
        let doc = Html::parse_document(
            r#"<body><h1>A</h1><h1>B</h1><img src="a.png"><img src="b.png" alt="b"></body>"#,
        );
        let evidence = BasicSeoScanner::analyze(&doc);
        assert_eq!(check_for(&evidence, "h1").score, 0.5);
        let alt = check_for(&evidence, "image_alt");
        assert_eq!(alt.score, 0.5);
        assert_eq!(alt.value.as_deref(), Some("1/2 with alt"));
    }

    #[tokio::test]
    async fn well_formed_page_passes() {
        let ctx = page_context("https://example.com/", GOOD_PAGE);
        let result = BasicSeoScanner.scan(&ctx).await.unwrap();
        assert_eq!(result.status, IndicatorStatus::Pass);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.message, "6/6 basic SEO checks passed");
        assert!(result.recommendation.is_none());
    }

    #[tokio::test]
    async fn bare_page_fails() {
        let ctx = page_context("https://example.com/", "<html><body><p>hi</p></body></html>");
        let result = BasicSeoScanner.scan(&ctx).await.unwrap();
        // Only the image check passes: 1/6.
        assert_eq!(result.status, IndicatorStatus::Fail);
        assert!(result.recommendation.unwrap().contains("Missing document title"));
    }
}
