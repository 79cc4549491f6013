//! Keyword impact heuristic over event titles.
//!
//! Each event type has an ordered list of tiers; the first tier with ANY
//! phrase contained in the lower-cased title wins, otherwise the type's
//! fallback applies. Matching is plain substring (`"high"` also hits
//! `"highlights"`).

use crate::ingest::types::EventType;

struct Tier {
    any_contains: &'static [&'static str],
    weight: f64,
}

const PRODUCT: &[Tier] = &[
    Tier {
        any_contains: &["major", "launch", "new product", "breakthrough"],
        weight: 1.5,
    },
    Tier {
        any_contains: &["feature", "update", "release"],
        weight: 1.0,
    },
];
const PRODUCT_FALLBACK: f64 = 0.5;

const PRESS: &[Tier] = &[Tier {
    any_contains: &["exclusive", "feature", "interview"],
    weight: 1.2,
}];
const PRESS_FALLBACK: f64 = 1.0;

const SECURITY: &[Tier] = &[
    Tier {
        any_contains: &["critical"],
        weight: 1.2,
    },
    Tier {
        any_contains: &["high"],
        weight: 1.0,
    },
    Tier {
        any_contains: &["medium"],
        weight: 0.7,
    },
];
const SECURITY_FALLBACK: f64 = 0.6;

/// Impact weight for one event title.
pub fn impact_weight(title: &str, event_type: EventType) -> f64 {
    let title = title.to_lowercase();
    match event_type {
        EventType::Product => first_tier(&title, PRODUCT).unwrap_or(PRODUCT_FALLBACK),
        EventType::Funding => 1.0,
        EventType::Press => first_tier(&title, PRESS).unwrap_or(PRESS_FALLBACK),
        EventType::Security => first_tier(&title, SECURITY).unwrap_or(SECURITY_FALLBACK),
        EventType::Other => 1.0,
    }
}

fn first_tier(title: &str, tiers: &[Tier]) -> Option<f64> {
    tiers
        .iter()
        .find(|t| t.any_contains.iter().any(|p| title.contains(p)))
        .map(|t| t.weight)
}
