use anyhow::Result;
use async_trait::async_trait;

use super::{found_status, Scanner, ScannerScope};
use crate::domain::{
    Evidence, IndicatorCategory, IndicatorResult, IndicatorStatus, LlmsTxtDocument,
    LlmsTxtEvidence, ScanContext,
};
use crate::service::http::Fetcher;

pub const LLMS_TXT_PATH: &str = "/llms.txt";

/// Checks for a well-formed `/llms.txt` at the site root.
pub struct LlmsTxtScanner {
    fetcher: Fetcher,
}

impl LlmsTxtScanner {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

/// Parse llms.txt directives. Returns the document and any validation issues.
///
/// Directives before the first `User-agent` belong to `*`; later directives
/// belong to the most recent `User-agent`.
pub fn parse_llms_txt(body: &str) -> (LlmsTxtDocument, Vec<String>) {
    let mut doc = LlmsTxtDocument::default();
    let mut issues = Vec::new();

    if body.trim().is_empty() {
        issues.push("File is empty".to_string());
        return (doc, issues);
    }

    let mut current_agent = "*".to_string();

    for (idx, raw_line) in body.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            issues.push(format!("Line {}: Invalid format, missing colon", line_no));
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_string();

        match key.as_str() {
            "user-agent" => {
                current_agent = value.clone();
                doc.agents.entry(value.clone()).or_default();
                doc.user_agent = Some(value);
            }
            "disallow" => doc
                .agents
                .entry(current_agent.clone())
                .or_default()
                .disallow
                .push(value),
            "allow" => doc
                .agents
                .entry(current_agent.clone())
                .or_default()
                .allow
                .push(value),
            "crawl-delay" => match value.parse::<f64>() {
                Ok(delay) => {
                    doc.agents
                        .entry(current_agent.clone())
                        .or_default()
                        .crawl_delay = Some(delay);
                }
                Err(_) => issues.push(format!("Line {}: Invalid crawl-delay value", line_no)),
            },
            _ => doc.directives.entry(key).or_default().push(value),
        }
    }

    if doc.user_agent.is_none() {
        issues.push("Missing User-agent directive".to_string());
    }

    (doc, issues)
}

#[async_trait]
impl Scanner for LlmsTxtScanner {
    fn name(&self) -> &str {
        "llms_txt"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Standards
    }

    fn description(&self) -> &str {
        "Checks for an llms.txt file describing how language models may use the site"
    }

    fn weight(&self) -> f64 {
        0.9
    }

    fn scope(&self) -> ScannerScope {
        ScannerScope::Site
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<IndicatorResult> {
        let url = ctx.well_known_url(LLMS_TXT_PATH)?;
        let fetched = self.fetcher.fetch(&url).await;

        let Some(body) = fetched.content.as_deref().filter(|_| fetched.found) else {
            return Ok(self
                .indicator(ctx, IndicatorStatus::Fail, 0.0, "No llms.txt file found")
                .with_recommendation(
                    "Publish an llms.txt file at the site root describing which content AI agents may use",
                )
                .with_evidence(Evidence::LlmsTxt(LlmsTxtEvidence {
                    url: url.to_string(),
                    content: None,
                    issues: Vec::new(),
                    error: Some(fetched.error_text()),
                })));
        };

        let (doc, issues) = parse_llms_txt(body);
        let (status, score) = found_status(&issues);
        let message = if issues.is_empty() {
            "Valid llms.txt file found".to_string()
        } else {
            format!("llms.txt found with {} validation issue(s)", issues.len())
        };

        let mut result = self
            .indicator(ctx, status, score, message)
            .with_found(true, issues.is_empty());
        if !issues.is_empty() {
            result = result.with_recommendation(format!("Fix llms.txt: {}", issues.join("; ")));
        }

        Ok(result.with_evidence(Evidence::LlmsTxt(LlmsTxtEvidence {
            url: url.to_string(),
            content: Some(doc),
            issues,
            error: None,
        })))
    }
}
