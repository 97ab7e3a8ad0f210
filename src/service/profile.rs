//! Site profile detection from structured data and URL shape.

use std::collections::BTreeSet;
use url::Url;

use crate::domain::{DetectionMethod, IndicatorResult, ProfileDetectionResult, SiteProfile};

const SCHEMA_CONFIDENCE: f64 = 0.4;
const URL_CONFIDENCE: f64 = 0.3;

struct Heuristic {
    profile: SiteProfile,
    schema_types: &'static [&'static str],
    /// Path segments, compared case-insensitively.
    path_segments: &'static [&'static str],
}

/// Evaluated in order; earlier entries win ties.
const HEURISTICS: [Heuristic; 5] = [
    Heuristic {
        profile: SiteProfile::Ecommerce,
        schema_types: &["Product", "Offer", "AggregateOffer"],
        path_segments: &["cart", "checkout", "product", "products"],
    },
    Heuristic {
        profile: SiteProfile::BlogContent,
        schema_types: &["Article", "BlogPosting", "NewsArticle"],
        path_segments: &["blog", "posts"],
    },
    Heuristic {
        profile: SiteProfile::SaasApp,
        schema_types: &["SoftwareApplication", "WebApplication"],
        path_segments: &["pricing", "signup", "login", "dashboard"],
    },
    Heuristic {
        profile: SiteProfile::KbSupport,
        schema_types: &["FAQPage", "HowTo", "QAPage"],
        path_segments: &["docs", "help", "support", "kb", "faq"],
    },
    Heuristic {
        profile: SiteProfile::GovNontransacting,
        schema_types: &["GovernmentOrganization", "GovernmentService"],
        path_segments: &[],
    },
];

pub const NO_SIGNALS: &str = "No clear profile signals detected";

/// Pick the active profile. A declared profile always wins.
pub fn detect_profile<'a>(
    indicators: impl IntoIterator<Item = &'a IndicatorResult>,
    url_samples: &[Url],
    declared: Option<SiteProfile>,
) -> ProfileDetectionResult {
    if let Some(profile) = declared {
        tracing::debug!("[PROFILE] Using declared profile {}", profile.as_str());
        return ProfileDetectionResult {
            profile,
            confidence: 1.0,
            method: DetectionMethod::Declared,
            signals: Vec::new(),
        };
    }

    let schema_types = observed_schema_types(indicators);
    let mut signals = Vec::new();
    let mut best: Option<(SiteProfile, f64)> = None;

    for heuristic in &HEURISTICS {
        let mut confidence = 0.0;

        let matched_types: Vec<&str> = heuristic
            .schema_types
            .iter()
            .copied()
            .filter(|t| schema_types.contains(*t))
            .collect();
        if !matched_types.is_empty() {
            confidence += SCHEMA_CONFIDENCE;
            signals.push(format!(
                "Schema types suggest {}: {}",
                heuristic.profile.as_str(),
                matched_types.join(", ")
            ));
        }

        let matched_paths = matching_paths(heuristic, url_samples);
        if !matched_paths.is_empty() {
            confidence += URL_CONFIDENCE;
            signals.push(format!(
                "URL paths suggest {}: {}",
                heuristic.profile.as_str(),
                matched_paths.join(", ")
            ));
        }

        if heuristic.profile == SiteProfile::GovNontransacting {
            if let Some(host) = url_samples.iter().filter_map(Url::host_str).find(|h| is_gov_host(h)) {
                confidence += URL_CONFIDENCE;
                signals.push(format!("Government host: {}", host));
            }
        }

        if confidence > 0.0 && best.map_or(true, |(_, c)| confidence > c) {
            best = Some((heuristic.profile, confidence));
        }
    }

    let result = match best {
        Some((profile, confidence)) => ProfileDetectionResult {
            profile,
            confidence: confidence.min(1.0),
            method: DetectionMethod::Inferred,
            signals,
        },
        None => ProfileDetectionResult {
            profile: SiteProfile::Custom,
            confidence: 0.0,
            method: DetectionMethod::Inferred,
            signals: vec![NO_SIGNALS.to_string()],
        },
    };

    tracing::debug!(
        "[PROFILE] Inferred {} (confidence {:.1}, {} signal(s))",
        result.profile.as_str(),
        result.confidence,
        result.signals.len()
    );
    result
}

/// Schema types recorded by every `json_ld` result.
fn observed_schema_types<'a>(
    indicators: impl IntoIterator<Item = &'a IndicatorResult>,
) -> BTreeSet<&'a str> {
    indicators
        .into_iter()
        .filter(|r| r.indicator_name == "json_ld")
        .filter_map(|r| r.evidence.json_ld())
        .flat_map(|e| e.schemas.iter().map(String::as_str))
        .collect()
}

/// Distinct matched segments, in heuristic order.
fn matching_paths(heuristic: &Heuristic, url_samples: &[Url]) -> Vec<String> {
    heuristic
        .path_segments
        .iter()
        .filter(|segment| {
            url_samples.iter().any(|url| {
                url.path_segments()
                    .map(|mut parts| parts.any(|p| p.eq_ignore_ascii_case(segment)))
                    .unwrap_or(false)
            })
        })
        .map(|segment| format!("/{}", segment))
        .collect()
}

fn is_gov_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host.ends_with(".gov") || host.contains(".gov.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Evidence, IndicatorCategory, IndicatorStatus, JsonLdEvidence};

    fn json_ld(types: &[&str]) -> IndicatorResult {
        IndicatorResult::new(
            "json_ld",
            IndicatorCategory::StructuredData,
            0.9,
            IndicatorStatus::Pass,
            8.0,
            "ok",
        )
        .with_evidence(Evidence::JsonLd(JsonLdEvidence {
            schemas: types.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }))
    }

    fn urls(list: &[&str]) -> Vec<Url> {
        list.iter().map(|u| Url::parse(u).unwrap()).collect()
    }

    #[test]
    fn declared_profile_wins_outright() {
        let result = detect_profile(
            &[json_ld(&["BlogPosting"])],
            &urls(&["https://example.com/blog/a"]),
            Some(SiteProfile::Ecommerce),
        );
        assert_eq!(result.profile, SiteProfile::Ecommerce);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.method, DetectionMethod::Declared);
        assert!(result.signals.is_empty());
    }

    #[test]
    fn product_schema_and_cart_path_infer_ecommerce() {
        let result = detect_profile(
            &[json_ld(&["Product", "Offer"])],
            &urls(&["https://shop.example.com/", "https://shop.example.com/cart"]),
            None,
        );
        assert_eq!(result.profile, SiteProfile::Ecommerce);
        assert!((result.confidence - 0.7).abs() < 1e-9);
        assert_eq!(
            result.signals,
            vec![
                "Schema types suggest ecommerce: Product, Offer".to_string(),
                "URL paths suggest ecommerce: /cart".to_string()
            ]
        );
    }

    #[test]
    fn stronger_evidence_beats_table_order() {
        let result = detect_profile(
            &[json_ld(&["BlogPosting"])],
            &urls(&["https://example.com/blog/post-1", "https://example.com/product/x"]),
            None,
        );
        assert_eq!(result.profile, SiteProfile::BlogContent);
        assert_eq!(result.signals.len(), 3);
    }

    #[test]
    fn ties_go_to_the_earlier_profile() {
        let result = detect_profile(
            &[],
            &urls(&["https://example.com/docs/start", "https://example.com/pricing"]),
            None,
        );
        assert_eq!(result.profile, SiteProfile::SaasApp);
    }

    #[test]
    fn government_host_is_recognised() {
        let result = detect_profile(&[], &urls(&["https://www.agency.gov.uk/"]), None);
        assert_eq!(result.profile, SiteProfile::GovNontransacting);
        assert_eq!(result.signals, vec!["Government host: www.agency.gov.uk".to_string()]);
    }

    #[test]
    fn no_signals_means_custom() {
        let result = detect_profile(&[], &urls(&["https://example.com/about"]), None);
        assert_eq!(result.profile, SiteProfile::Custom);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.signals, vec![NO_SIGNALS.to_string()]);
    }

    #[test]
    fn path_tokens_match_whole_segments_only() {
        let result = detect_profile(&[], &urls(&["https://example.com/kbase/cartography"]), None);
        assert_eq!(result.profile, SiteProfile::Custom);
    }
}
