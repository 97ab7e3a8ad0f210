//! Which indicators matter for which site profile, and where they count.

use crate::domain::{Applicability, ApplicabilityStatus, ReportCategory, SiteProfile};

use ApplicabilityStatus::{NotApplicable as NA, Optional as Opt, Required as Req};

/// Columns follow [`PROFILE_COLUMNS`].
const MATRIX: [(&str, [ApplicabilityStatus; 6]); 6] = [
    ("llms_txt", [Req, Req, Req, Req, Opt, Opt]),
    ("robots_txt", [Req, Req, Req, Req, Req, Req]),
    ("sitemap_xml", [Req, Opt, Req, Req, Req, Opt]),
    ("json_ld", [Req, Opt, Req, Req, Opt, Opt]),
    ("mcp", [Req, Req, NA, Opt, NA, Opt]),
    ("agents_json", [Req, Req, NA, Opt, NA, Opt]),
];

const PROFILE_COLUMNS: [SiteProfile; 6] = [
    SiteProfile::Ecommerce,
    SiteProfile::SaasApp,
    SiteProfile::BlogContent,
    SiteProfile::KbSupport,
    SiteProfile::GovNontransacting,
    SiteProfile::Custom,
];

const CATEGORY_MEMBERSHIP: [(&str, &[ReportCategory]); 8] = [
    ("llms_txt", &[ReportCategory::Discovery, ReportCategory::Understanding]),
    ("robots_txt", &[ReportCategory::Discovery, ReportCategory::Trust]),
    ("sitemap_xml", &[ReportCategory::Discovery]),
    ("json_ld", &[ReportCategory::Understanding]),
    ("canonical_urls", &[ReportCategory::Understanding, ReportCategory::Trust]),
    ("basic_seo", &[ReportCategory::Understanding]),
    ("mcp", &[ReportCategory::Actions]),
    ("agents_json", &[ReportCategory::Actions]),
];

/// Policy status for an indicator on a profile. Unlisted pairs are optional.
pub fn applicability_status(indicator: &str, profile: SiteProfile) -> ApplicabilityStatus {
    let column = PROFILE_COLUMNS
        .iter()
        .position(|p| *p == profile)
        .unwrap_or(PROFILE_COLUMNS.len() - 1);

    MATRIX
        .iter()
        .find(|(name, _)| *name == indicator)
        .map(|(_, row)| row[column])
        .unwrap_or(ApplicabilityStatus::Optional)
}

pub fn applicability_for(indicator: &str, profile: SiteProfile) -> Applicability {
    let status = applicability_status(indicator, profile);
    let reason = match status {
        ApplicabilityStatus::Required => {
            format!("{} is required for {} sites", indicator, profile.as_str())
        }
        ApplicabilityStatus::Optional => {
            format!("{} is optional for {} sites", indicator, profile.as_str())
        }
        ApplicabilityStatus::NotApplicable => format!(
            "{} does not apply to {} sites and is excluded from scoring",
            indicator,
            profile.as_str()
        ),
    };
    Applicability::new(status, reason)
}

/// Report categories an indicator contributes to. Unknown indicators count nowhere.
pub fn categories_for(indicator: &str) -> &'static [ReportCategory] {
    CATEGORY_MEMBERSHIP
        .iter()
        .find(|(name, _)| *name == indicator)
        .map(|(_, categories)| *categories)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcp_depends_on_profile() {
        assert_eq!(
            applicability_status("mcp", SiteProfile::Ecommerce),
            ApplicabilityStatus::Required
        );
        let blog = applicability_for("mcp", SiteProfile::BlogContent);
        assert_eq!(blog.status, ApplicabilityStatus::NotApplicable);
        assert!(!blog.included_in_category_math);
        assert_eq!(
            blog.reason,
            "mcp does not apply to blog_content sites and is excluded from scoring"
        );
    }

    #[test]
    fn unlisted_pairs_default_to_optional() {
        let a = applicability_for("basic_seo", SiteProfile::GovNontransacting);
        assert_eq!(a.status, ApplicabilityStatus::Optional);
        assert!(a.included_in_category_math);
        assert_eq!(
            applicability_status("my_custom_check", SiteProfile::Ecommerce),
            ApplicabilityStatus::Optional
        );
    }

    #[test]
    fn robots_is_required_everywhere() {
        for profile in SiteProfile::ALL {
            assert_eq!(
                applicability_status("robots_txt", profile),
                ApplicabilityStatus::Required
            );
        }
    }

    #[test]
    fn category_membership() {
        assert_eq!(
            categories_for("robots_txt"),
            &[ReportCategory::Discovery, ReportCategory::Trust]
        );
        assert_eq!(categories_for("agents_json"), &[ReportCategory::Actions]);
        assert_eq!(
            categories_for("canonical_urls"),
            &[ReportCategory::Understanding, ReportCategory::Trust]
        );
        assert!(categories_for("my_custom_check").is_empty());
    }
}
