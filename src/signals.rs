//! signals.rs: alerts derived from a watch-list run, one per company that
//! had events in the scoring window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ingest::types::{EventType, RawEvent};
use crate::quadrant::Quadrant;
use crate::report::CompanyScoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn for_quadrant(q: Quadrant) -> Self {
        match q {
            Quadrant::Leader => Severity::High,
            Quadrant::EmergingDisruptor | Quadrant::SleepingGiant => Severity::Medium,
            Quadrant::NicheWatch => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: u64,
    pub company_id: u64,
    /// Most frequent event type behind the signal.
    pub kind: EventType,
    pub title: String,
    pub summary: String,
    pub severity: Severity,
    pub confidence: f64,
    #[serde(default)]
    pub urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Signal fields before the store assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSignal {
    pub company_id: u64,
    pub kind: EventType,
    pub title: String,
    pub summary: String,
    pub severity: Severity,
    pub confidence: f64,
    pub urls: Vec<String>,
}

/// Most frequent event type; ties go to the type listed first in `EventType`.
pub fn dominant_type(events: &[RawEvent]) -> Option<EventType> {
    let mut counts: BTreeMap<EventType, usize> = BTreeMap::new();
    for e in events {
        *counts.entry(e.event_type).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(t, _)| t)
}

/// Signal for one scored company; `None` when it had no events to report on.
pub fn signal_for(result: &CompanyScoreResult, dominant: Option<EventType>) -> Option<NewSignal> {
    let kind = dominant?;
    Some(NewSignal {
        company_id: result.company_id,
        kind,
        title: format!("{}: {}", result.company_name, result.quadrant.label()),
        summary: result.explanations.join(" "),
        severity: Severity::for_quadrant(result.quadrant),
        confidence: result.confidence,
        urls: result.sample_links.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(t: EventType) -> RawEvent {
        RawEvent::new("t", "u", None, t)
    }

    fn result(q: Quadrant) -> CompanyScoreResult {
        CompanyScoreResult {
            company_id: 4,
            company_name: "Acme".into(),
            activity_score: 1.0,
            activity_percentile: 90.0,
            activity_z_score: 1.2,
            impact_score: 2.0,
            momentum: 0.0,
            confidence: 0.8,
            quadrant: q,
            explanations: vec!["2 events.".into(), "Top: launch.".into()],
            sample_links: vec!["https://acme.com/a".into()],
        }
    }

    #[test]
    fn dominant_type_counts_and_breaks_ties_in_enum_order() {
        assert_eq!(dominant_type(&[]), None);
        let evs = [ev(EventType::Press), ev(EventType::Funding), ev(EventType::Press)];
        assert_eq!(dominant_type(&evs), Some(EventType::Press));
        let tie = [ev(EventType::Security), ev(EventType::Product)];
        assert_eq!(dominant_type(&tie), Some(EventType::Product));
    }

    #[test]
    fn signal_carries_result_fields() {
        let s = signal_for(&result(Quadrant::Leader), Some(EventType::Product)).unwrap();
        assert_eq!(s.title, "Acme: Leader");
        assert_eq!(s.summary, "2 events. Top: launch.");
        assert_eq!(s.severity, Severity::High);
        assert_eq!(s.urls, vec!["https://acme.com/a"]);
        assert!(signal_for(&result(Quadrant::NicheWatch), None).is_none());
        assert_eq!(Severity::for_quadrant(Quadrant::NicheWatch), Severity::Low);
    }
}
