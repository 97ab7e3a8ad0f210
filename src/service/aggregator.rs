//! Turns per-page indicator results into the weighted, profile-aware report.
//!
//! Pure and synchronous: no I/O, and the same input always yields the same
//! scores. Only `scan_date` and a generated `audit_id` vary between calls.

use chrono::Utc;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use url::Url;
use uuid::Uuid;

use crate::config::{EngineConfig, DEFAULT_CRITICAL_WEIGHT_THRESHOLD};
use crate::domain::{
    Applicability, ApplicabilityStatus, CategoryReport, CategoryScore, CategoryWeights,
    CriticalIssue, IndicatorContribution, IndicatorResult, IndicatorStatus, OverallScore,
    Priority, ReadinessLevel, Recommendation, Report, ReportCategory, ReportSummary, Score,
    SiteProfile,
};
use crate::service::applicability::{applicability_for, categories_for};
use crate::service::profile::detect_profile;

/// One indicator summarised across every page it ran on.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRollup {
    pub indicator_name: String,
    /// Mean normalized score of the results that are not `not_applicable`.
    pub score: f64,
    /// Worst status seen.
    pub status: IndicatorStatus,
    pub weight: f64,
    pub message: String,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    critical_weight_threshold: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_WEIGHT_THRESHOLD)
    }
}

impl Aggregator {
    pub fn new(critical_weight_threshold: f64) -> Self {
        Self {
            critical_weight_threshold,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.critical_weight_threshold)
    }

    pub fn aggregate(
        &self,
        site_url: &str,
        page_results: &BTreeMap<String, Vec<IndicatorResult>>,
        declared_profile: Option<SiteProfile>,
    ) -> Report {
        self.aggregate_audit(
            &Uuid::new_v4().to_string(),
            site_url,
            page_results,
            page_results.len(),
            declared_profile,
        )
    }

    /// Build the report for a known audit id.
    ///
    /// `pages_scanned` is the number of crawled pages, which can differ from
    /// the map's keys when site-level results sit under the site URL.
    pub fn aggregate_audit(
        &self,
        audit_id: &str,
        site_url: &str,
        page_results: &BTreeMap<String, Vec<IndicatorResult>>,
        pages_scanned: usize,
        declared_profile: Option<SiteProfile>,
    ) -> Report {
        let results: Vec<&IndicatorResult> = page_results.values().flatten().collect();

        let mut url_samples: Vec<Url> = page_results
            .keys()
            .filter_map(|u| Url::parse(u).ok())
            .collect();
        if let Ok(site) = Url::parse(site_url) {
            url_samples.push(site);
        }

        let profile = detect_profile(results.iter().copied(), &url_samples, declared_profile);

        let applicability: BTreeMap<String, Applicability> = results
            .iter()
            .map(|r| {
                (
                    r.indicator_name.clone(),
                    applicability_for(&r.indicator_name, profile.profile),
                )
            })
            .collect();

        let categories: BTreeMap<ReportCategory, CategoryReport> = ReportCategory::ALL
            .into_iter()
            .map(|category| (category, category_report(category, &results, &applicability)))
            .collect();

        let weights = CategoryWeights::default();
        let raw = categories
            .iter()
            .map(|(category, report)| report.score.score.raw() * category.weight())
            .sum::<f64>()
            .clamp(0.0, 1.0);
        let overall = OverallScore::from_raw(raw);

        let rollups = rollup(&results);
        let summary = self.summarize(&rollups, &applicability, overall);

        tracing::info!(
            "[AGGREGATE] {} indicator result(s) across {} page(s): score {} ({}), profile {}",
            results.len(),
            pages_scanned,
            overall.score100,
            summary.ai_readiness.as_str(),
            profile.profile.as_str()
        );

        Report {
            audit_id: audit_id.to_string(),
            site_url: site_url.to_string(),
            scan_date: Utc::now(),
            pages_scanned,
            profile,
            applicability,
            categories,
            weights,
            overall,
            summary,
        }
    }

    fn summarize(
        &self,
        rollups: &BTreeMap<String, IndicatorRollup>,
        applicability: &BTreeMap<String, Applicability>,
        overall: OverallScore,
    ) -> ReportSummary {
        let applicable: Vec<(&IndicatorRollup, ApplicabilityStatus)> = rollups
            .values()
            .filter_map(|r| {
                let status = applicability.get(&r.indicator_name)?.status;
                (status != ApplicabilityStatus::NotApplicable).then_some((r, status))
            })
            .collect();

        let mut critical_issues: Vec<CriticalIssue> = applicable
            .iter()
            .filter(|(r, _)| {
                r.status == IndicatorStatus::Fail && r.weight > self.critical_weight_threshold
            })
            .map(|(r, _)| CriticalIssue {
                indicator_name: r.indicator_name.clone(),
                message: r.message.clone(),
                weight: r.weight,
                recommendation: r.recommendation.clone(),
            })
            .collect();
        critical_issues.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.indicator_name.cmp(&b.indicator_name))
        });

        let mut recommendations: Vec<Recommendation> = applicable
            .iter()
            .filter(|(r, _)| {
                !matches!(r.status, IndicatorStatus::Pass | IndicatorStatus::NotApplicable)
            })
            .filter_map(|(r, status)| {
                Some(Recommendation {
                    indicator_name: r.indicator_name.clone(),
                    priority: Priority::from_weight(r.weight),
                    weight: r.weight,
                    applicability: *status,
                    status: r.status,
                    message: r.message.clone(),
                    recommendation: r.recommendation.clone()?,
                })
            })
            .collect();
        recommendations.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| requirement_rank(a.applicability).cmp(&requirement_rank(b.applicability)))
                .then_with(|| a.indicator_name.cmp(&b.indicator_name))
        });

        let scored: Vec<&IndicatorRollup> = applicable
            .iter()
            .map(|(r, _)| *r)
            .filter(|r| r.status != IndicatorStatus::NotApplicable)
            .collect();
        let passed = scored
            .iter()
            .filter(|r| r.status == IndicatorStatus::Pass)
            .count();
        let completion_percentage = if scored.is_empty() {
            0
        } else {
            Score::from(passed as f64 / scored.len() as f64).integer()
        };

        ReportSummary {
            critical_issues,
            recommendations,
            completion_percentage,
            ai_readiness_percentage: overall.score100,
            ai_readiness: ReadinessLevel::from_score100(overall.score100),
        }
    }
}

fn requirement_rank(status: ApplicabilityStatus) -> u8 {
    match status {
        ApplicabilityStatus::Required => 0,
        ApplicabilityStatus::Optional => 1,
        ApplicabilityStatus::NotApplicable => 2,
    }
}

fn category_report(
    category: ReportCategory,
    results: &[&IndicatorResult],
    applicability: &BTreeMap<String, Applicability>,
) -> CategoryReport {
    let mut indicators = Vec::new();
    let mut included_scores = Vec::new();
    let (mut passed, mut warned, mut failed) = (0, 0, 0);

    for result in results
        .iter()
        .filter(|r| categories_for(&r.indicator_name).contains(&category))
    {
        let included = result.status != IndicatorStatus::NotApplicable
            && applicability
                .get(&result.indicator_name)
                .map(|a| a.included_in_category_math)
                .unwrap_or(true);
        let score = result.normalized_score();

        if included {
            included_scores.push(score);
            match result.status {
                IndicatorStatus::Pass => passed += 1,
                IndicatorStatus::Warn => warned += 1,
                IndicatorStatus::Fail => failed += 1,
                IndicatorStatus::NotApplicable => {}
            }
        }

        indicators.push(IndicatorContribution {
            indicator_name: result.indicator_name.clone(),
            page_url: result.page_url.clone(),
            status: result.status,
            score,
            weight: result.weight,
            included_in_category_math: included,
        });
    }

    let mean = if included_scores.is_empty() {
        0.0
    } else {
        included_scores.iter().sum::<f64>() / included_scores.len() as f64
    };

    CategoryReport {
        score: CategoryScore {
            category,
            score: Score::from(mean),
            indicator_count: included_scores.len(),
            passed_count: passed,
            warning_count: warned,
            failed_count: failed,
        },
        indicators,
    }
}

/// Collapse each indicator's per-page results.
pub fn rollup(results: &[&IndicatorResult]) -> BTreeMap<String, IndicatorRollup> {
    let mut grouped: BTreeMap<&str, Vec<&IndicatorResult>> = BTreeMap::new();
    for result in results {
        grouped
            .entry(result.indicator_name.as_str())
            .or_default()
            .push(result);
    }

    grouped
        .into_iter()
        .filter_map(|(name, group)| {
            let worst = group
                .iter()
                .copied()
                .reduce(|worst, r| {
                    if r.status.severity() > worst.status.severity() {
                        r
                    } else {
                        worst
                    }
                })?;

            let scores: Vec<f64> = group
                .iter()
                .filter(|r| r.status != IndicatorStatus::NotApplicable)
                .map(|r| r.normalized_score())
                .collect();
            let score = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };

            Some((
                name.to_string(),
                IndicatorRollup {
                    indicator_name: name.to_string(),
                    score,
                    status: worst.status,
                    weight: worst.weight,
                    message: worst.message.clone(),
                    recommendation: worst
                        .recommendation
                        .clone()
                        .or_else(|| group.iter().find_map(|r| r.recommendation.clone())),
                },
            ))
        })
        .collect()
}
