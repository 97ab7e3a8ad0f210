//! The report built once per audit by the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::models::{
    Applicability, ApplicabilityStatus, IndicatorStatus, ProfileDetectionResult, ReportCategory,
    Score,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: ReportCategory,
    pub score: Score,
    pub indicator_count: usize,
    pub passed_count: usize,
    pub warning_count: usize,
    pub failed_count: usize,
}

/// One indicator result as it contributed (or not) to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorContribution {
    pub indicator_name: String,
    pub page_url: Option<String>,
    pub status: IndicatorStatus,
    pub score: f64,
    pub weight: f64,
    pub included_in_category_math: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    #[serde(flatten)]
    pub score: CategoryScore,
    pub indicators: Vec<IndicatorContribution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub discovery: f64,
    pub understanding: f64,
    pub actions: f64,
    pub trust: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            discovery: ReportCategory::Discovery.weight(),
            understanding: ReportCategory::Understanding.weight(),
            actions: ReportCategory::Actions.weight(),
            trust: ReportCategory::Trust.weight(),
        }
    }
}

impl CategoryWeights {
    pub fn total(&self) -> f64 {
        self.discovery + self.understanding + self.actions + self.trust
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub raw: f64,
    pub score100: u8,
}

impl OverallScore {
    pub fn from_raw(raw: f64) -> Self {
        Self {
            raw,
            score100: Score::from(raw).integer(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_weight(weight: f64) -> Self {
        if weight >= 0.8 {
            Priority::High
        } else if weight >= 0.5 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessLevel {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl ReadinessLevel {
    pub fn from_score100(score: u8) -> Self {
        match score {
            80..=u8::MAX => ReadinessLevel::Excellent,
            60..=79 => ReadinessLevel::Good,
            40..=59 => ReadinessLevel::NeedsImprovement,
            _ => ReadinessLevel::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessLevel::Excellent => "excellent",
            ReadinessLevel::Good => "good",
            ReadinessLevel::NeedsImprovement => "needs_improvement",
            ReadinessLevel::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalIssue {
    pub indicator_name: String,
    pub message: String,
    pub weight: f64,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub indicator_name: String,
    pub priority: Priority,
    pub weight: f64,
    pub applicability: ApplicabilityStatus,
    pub status: IndicatorStatus,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub critical_issues: Vec<CriticalIssue>,
    pub recommendations: Vec<Recommendation>,
    pub completion_percentage: u8,
    pub ai_readiness_percentage: u8,
    pub ai_readiness: ReadinessLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub audit_id: String,
    pub site_url: String,
    pub scan_date: DateTime<Utc>,
    pub pages_scanned: usize,
    pub profile: ProfileDetectionResult,
    pub applicability: BTreeMap<String, Applicability>,
    pub categories: BTreeMap<ReportCategory, CategoryReport>,
    pub weights: CategoryWeights,
    pub overall: OverallScore,
    pub summary: ReportSummary,
}

impl Report {
    pub fn category_score(&self, category: ReportCategory) -> f64 {
        self.categories
            .get(&category)
            .map(|c| c.score.score.raw())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score100_rounds_raw() {
        assert_eq!(OverallScore::from_raw(0.0).score100, 0);
        assert_eq!(OverallScore::from_raw(0.444).score100, 44);
        assert_eq!(OverallScore::from_raw(0.456).score100, 46);
        assert_eq!(OverallScore::from_raw(1.0).score100, 100);
    }

    #[test]
    fn readiness_levels_follow_score_bands() {
        assert_eq!(ReadinessLevel::from_score100(95), ReadinessLevel::Excellent);
        assert_eq!(ReadinessLevel::from_score100(80), ReadinessLevel::Excellent);
        assert_eq!(ReadinessLevel::from_score100(60), ReadinessLevel::Good);
        assert_eq!(ReadinessLevel::from_score100(40), ReadinessLevel::NeedsImprovement);
        assert_eq!(ReadinessLevel::from_score100(39), ReadinessLevel::Poor);
    }

    #[test]
    fn priority_from_weight() {
        assert_eq!(Priority::from_weight(0.9), Priority::High);
        assert_eq!(Priority::from_weight(0.6), Priority::Medium);
        assert_eq!(Priority::from_weight(0.3), Priority::Low);
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!((CategoryWeights::default().total() - 1.0).abs() < 1e-9);
    }
}
