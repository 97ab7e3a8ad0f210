use anyhow::Result;
use async_trait::async_trait;

use super::{Scanner, ScannerScope};
use crate::domain::{
    Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, RobotsTxtEvidence, ScanContext,
};
use crate::extractor::RobotsTxt;
use crate::service::http::Fetcher;

pub const ROBOTS_TXT_PATH: &str = "/robots.txt";

/// User agents of well-known AI crawlers and assistants.
pub const AI_CRAWLERS: [&str; 10] = [
    "GPTBot",
    "ChatGPT-User",
    "OAI-SearchBot",
    "ClaudeBot",
    "Claude-Web",
    "anthropic-ai",
    "PerplexityBot",
    "Google-Extended",
    "CCBot",
    "Applebot-Extended",
];

const MIN_FOUND_SCORE: f64 = 0.1;
const PASS_THRESHOLD: f64 = 0.8;

/// Checks robots.txt exists and whether it shuts AI crawlers out.
pub struct RobotsTxtScanner {
    fetcher: Fetcher,
}

impl RobotsTxtScanner {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    fn evaluate(robots: &RobotsTxt) -> (Vec<String>, Vec<String>, f64) {
        let (blocked, allowed): (Vec<&str>, Vec<&str>) = AI_CRAWLERS
            .into_iter()
            .partition(|agent| robots.is_path_blocked(agent, "/"));

        let blocked_share = blocked.len() as f64 / AI_CRAWLERS.len() as f64;
        let score = (1.0 - 0.5 * blocked_share - 0.1 * robots.issues.len() as f64)
            .max(MIN_FOUND_SCORE);

        (
            blocked.into_iter().map(String::from).collect(),
            allowed.into_iter().map(String::from).collect(),
            score,
        )
    }
}

#[async_trait]
impl Scanner for RobotsTxtScanner {
    fn name(&self) -> &str {
        "robots_txt"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Seo
    }

    fn description(&self) -> &str {
        "Checks robots.txt and whether AI crawlers are allowed to access the site"
    }

    fn weight(&self) -> f64 {
        0.8
    }

    fn scope(&self) -> ScannerScope {
        ScannerScope::Site
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let url = ctx.well_known_url(ROBOTS_TXT_PATH)?;
        let fetched = self.fetcher.fetch(&url).await;

        let Some(body) = fetched.content.as_deref().filter(|_| fetched.found) else {
            return Ok(self
                .indicator(ctx, IndicatorStatus::Fail, 0.0, "No robots.txt file found")
                .with_recommendation(
                    "Add a robots.txt file that states crawl rules for search and AI crawlers",
                )
                .with_evidence(Evidence::RobotsTxt(RobotsTxtEvidence {
                    url: url.to_string(),
                    error: Some(fetched.error_text()),
                    ..Default::default()
                })));
        };

        let robots = RobotsTxt::parse(body);
        let (blocked, allowed, score) = Self::evaluate(&robots);
        let status = if score >= PASS_THRESHOLD {
            IndicatorStatus::Pass
        } else {
            IndicatorStatus::Warn
        };

        let message = if blocked.is_empty() {
            "robots.txt allows AI crawlers".to_string()
        } else {
            format!(
                "robots.txt blocks {} of {} AI crawlers",
                blocked.len(),
                AI_CRAWLERS.len()
            )
        };

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_found(true, robots.issues.is_empty());
        if status != IndicatorStatus::Pass {
            let mut advice = Vec::new();
            if !blocked.is_empty() {
                advice.push(format!("Review rules blocking {}", blocked.join(", ")));
            }
            if !robots.issues.is_empty() {
                advice.push(format!("fix {}", robots.issues.join("; ")));
            }
            result = result.with_recommendation(advice.join("; "));
        }

        Ok(result.with_evidence(Evidence::RobotsTxt(RobotsTxtEvidence {
            url: url.to_string(),
            blocked_ai_crawlers: blocked,
            allowed_ai_crawlers: allowed,
            sitemaps: robots.sitemaps,
            issues: robots.issues,
            error: None,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::scanner::test_support::{fetcher, site_context};

    async fn scan_body(status: usize, body: &str) -> IndicatorResult {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/robots.txt")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        RobotsTxtScanner::new(fetcher())
            .scan(&site_context(&server.url()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_robots_passes() {
        let result = scan_body(
            200,
            "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/sitemap.xml\n",
        )
        .await;

        assert_eq!(result.status, IndicatorStatus::Pass);
        assert_eq!(result.score, 1.0);
        match &result.evidence {
            Evidence::RobotsTxt(e) => {
                assert!(e.blocked_ai_crawlers.is_empty());
                assert_eq!(e.allowed_ai_crawlers.len(), AI_CRAWLERS.len());
                assert_eq!(e.sitemaps, vec!["https://example.com/sitemap.xml"]);
            }
            other => panic!("unexpected evidence: {:?}", other),
        }
    }

    #[tokio::test]
    async fn blocking_everything_warns() {
        let result = scan_body(200, "User-agent: *\nDisallow: /\n").await;

        assert_eq!(result.status, IndicatorStatus::Warn);
        assert!((result.score - 0.5).abs() < 1e-9);
        assert!(result.recommendation.unwrap().contains("GPTBot"));
    }

    #[tokio::test]
    async fn blocking_some_crawlers_lowers_score() {
        let result = scan_body(
            200,
            "User-agent: GPTBot\nDisallow: /\n\nUser-agent: CCBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n",
        )
        .await;

        assert_eq!(result.status, IndicatorStatus::Pass);
        assert!((result.score - 0.9).abs() < 1e-9);
        assert_eq!(result.message, "robots.txt blocks 2 of 10 AI crawlers");
    }

    #[tokio::test]
    async fn missing_robots_fails() {
        let result = scan_body(404, "").await;

        assert_eq!(result.status, IndicatorStatus::Fail);
        assert_eq!(result.score, 0.0);
        assert!(!result.found);
    }
}
