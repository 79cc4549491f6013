//! # Source Weights
//!
//! Maps the domain an event was published on to a credibility weight in
//! `[0.0, 1.0]`.
//!
//! - Domain is the third `/`-separated segment of the URL (`https://host/...`).
//! - Lookup order: exact domain override → tier-1 media substring →
//!   blog/news pattern substring → low-tier fallback.
//! - Class weights come from `ScoringConfiguration::source_credibility_weights`.
//!
//! Malformed URLs produce an empty domain, which lands in the fallback tier.

use serde::Serialize;

use crate::config::scoring::{
    ScoringConfiguration, COMPANY_BLOG, LOW_TIER_AGGREGATOR, TIER1_TECH_MEDIA,
};

pub const TIER1_MEDIA_DOMAINS: [&str; 5] = [
    "techcrunch.com",
    "theverge.com",
    "arstechnica.com",
    "wired.com",
    "engadget.com",
];

/// Matched against the extracted domain only, so the path-shaped patterns
/// never fire on a bare host; `medium.com` is the one that does.
pub const BLOG_PATTERNS: [&str; 4] = [".com/blog", "/blog/", "medium.com", "/news/"];

/// Which rule produced the weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum SourceClass {
    ExactDomain(String),
    Tier1TechMedia,
    CompanyBlog,
    LowTierAggregator,
}

impl SourceClass {
    pub fn label(&self) -> &str {
        match self {
            SourceClass::ExactDomain(d) => d.as_str(),
            SourceClass::Tier1TechMedia => TIER1_TECH_MEDIA,
            SourceClass::CompanyBlog => COMPANY_BLOG,
            SourceClass::LowTierAggregator => LOW_TIER_AGGREGATOR,
        }
    }
}

/// Third `/`-delimited segment, or `""` when the URL has fewer segments.
pub fn extract_domain(url: &str) -> &str {
    url.split('/').nth(2).unwrap_or("")
}

pub fn classify(domain: &str, cfg: &ScoringConfiguration) -> SourceClass {
    if cfg.source_credibility_weights.contains_key(domain) {
        return SourceClass::ExactDomain(domain.to_string());
    }
    if TIER1_MEDIA_DOMAINS.iter().any(|t| domain.contains(t)) {
        SourceClass::Tier1TechMedia
    } else if BLOG_PATTERNS.iter().any(|p| domain.contains(p)) {
        SourceClass::CompanyBlog
    } else {
        SourceClass::LowTierAggregator
    }
}

/// Credibility weight for a domain.
pub fn weight_for_domain(domain: &str, cfg: &ScoringConfiguration) -> f64 {
    weight_for_class(&classify(domain, cfg), cfg)
}

pub fn weight_for_class(class: &SourceClass, cfg: &ScoringConfiguration) -> f64 {
    match class {
        SourceClass::ExactDomain(d) => cfg
            .source_credibility_weights
            .get(d)
            .copied()
            .unwrap_or_else(|| cfg.class_weight(LOW_TIER_AGGREGATOR)),
        other => cfg.class_weight(other.label()),
    }
}

/// Convenience for callers holding a URL.
pub fn weight_for_url(url: &str, cfg: &ScoringConfiguration) -> f64 {
    weight_for_domain(extract_domain(url), cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ScoringConfiguration {
        ScoringConfiguration::default()
    }

    #[test]
    fn domain_is_third_segment() {
        assert_eq!(extract_domain("https://techcrunch.com/2025/01/x"), "techcrunch.com");
        assert_eq!(extract_domain("https://acme.io"), "acme.io");
        assert_eq!(extract_domain("not a url"), "");
        assert_eq!(extract_domain("a/b"), "");
        assert_eq!(extract_domain(""), "");
    }

    #[test]
    fn tier1_substring_match() {
        let c = cfg();
        assert_eq!(weight_for_url("https://techcrunch.com/a", &c), 1.0);
        assert_eq!(weight_for_url("https://www.wired.com/story/x", &c), 1.0);
    }

    #[test]
    fn blog_pattern_match_on_domain() {
        let c = cfg();
        assert_eq!(weight_for_url("https://medium.com/@acme/post", &c), 0.9);
        assert_eq!(weight_for_url("https://acme.medium.com/post", &c), 0.9);
    }

    #[test]
    fn path_patterns_do_not_reach_bare_domains() {
        // `/blog/` lives in the path, not in the extracted domain.
        let c = cfg();
        assert_eq!(weight_for_url("https://acme.com/blog/launch", &c), 0.5);
    }

    #[test]
    fn exact_domain_override_wins() {
        let mut c = cfg();
        c.source_credibility_weights
            .insert("techcrunch.com".into(), 0.3);
        assert_eq!(
            classify("techcrunch.com", &c),
            SourceClass::ExactDomain("techcrunch.com".into())
        );
        assert_eq!(weight_for_domain("techcrunch.com", &c), 0.3);
        // subdomain is not an exact match, falls through to tier-1
        assert_eq!(weight_for_domain("www.techcrunch.com", &c), 1.0);
    }

    #[test]
    fn malformed_url_falls_back_to_low_tier() {
        let c = cfg();
        assert_eq!(classify(extract_domain("garbage"), &c), SourceClass::LowTierAggregator);
        assert_eq!(weight_for_url("garbage", &c), 0.5);
    }

    #[test]
    fn class_weights_follow_config() {
        let mut c = cfg();
        c.source_credibility_weights
            .insert(LOW_TIER_AGGREGATOR.into(), 0.2);
        assert_eq!(weight_for_url("https://news.example.org/x", &c), 0.2);
    }
}
