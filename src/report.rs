//! report.rs: per-company output of one scoring run, plus the
//! explainability helpers (human-readable reasons, sample links).
//!
//! Explanations are for display only; nothing downstream parses them.

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::analyze::scoring::ProcessedEvent;
use crate::ingest::types::EventType;
use crate::quadrant::Quadrant;

pub const MAX_SAMPLE_LINKS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyScoreResult {
    pub company_id: u64,
    pub company_name: String,
    /// Stabilized, size-normalized activity.
    pub activity_score: f64,
    pub activity_percentile: f64,
    pub activity_z_score: f64,
    /// Σ per-event impact weight, not normalized by size.
    pub impact_score: f64,
    pub momentum: f64,
    pub confidence: f64,
    pub quadrant: Quadrant,
    #[serde(default)]
    pub explanations: Vec<String>,
    #[serde(default)]
    pub sample_links: Vec<String>,
}

impl CompanyScoreResult {
    /// Descending by activity score; ties broken by company id for a stable order.
    pub fn sort_by_activity(results: &mut [CompanyScoreResult]) {
        results.sort_by(|a, b| {
            b.activity_score
                .total_cmp(&a.activity_score)
                .then(a.company_id.cmp(&b.company_id))
        });
    }
}

/// URLs of the highest-scoring events (ties keep input order).
pub fn sample_links(events: &[ProcessedEvent]) -> Vec<String> {
    let mut idx: Vec<usize> = (0..events.len()).collect();
    idx.sort_by(|&a, &b| events[b].raw_score.total_cmp(&events[a].raw_score));
    idx.into_iter()
        .map(|i| events[i].url.clone())
        .filter(|u| !u.is_empty())
        .take(MAX_SAMPLE_LINKS)
        .collect()
}

/// Builder for the explanation list of one company.
#[derive(Debug, Default)]
pub struct Explanations {
    lines: Vec<String>,
}

impl Explanations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coverage(mut self, events: &[ProcessedEvent], dropped_duplicates: usize) -> Self {
        if events.is_empty() {
            self.lines
                .push("No events in the scoring window; scores default to zero.".into());
            return self;
        }
        let mut types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        types.sort();
        types.dedup();
        let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        let mut line = format!(
            "{} events across {} type(s): {}",
            events.len(),
            types.len(),
            names.join(", ")
        );
        if dropped_duplicates > 0 {
            line.push_str(&format!(" ({dropped_duplicates} duplicate(s) removed)"));
        }
        self.lines.push(line);
        self
    }

    pub fn stabilizers(mut self, agg: &Aggregate) -> Self {
        if let Some(w) = agg.burst {
            self.lines.push(format!(
                "Burst penalty x0.90: {:.0}% of activity fell in {}-W{:02}",
                w.share * 100.0,
                w.iso_year,
                w.iso_week
            ));
        }
        if agg.diversity_bonus {
            self.lines.push(format!(
                "Diversity bonus x1.05: {} distinct event types",
                agg.distinct_types
            ));
        }
        self
    }

    pub fn size(mut self, agg: &Aggregate, employee_count: Option<i64>) -> Self {
        let basis = if employee_count.is_some_and(|n| n > 0) {
            "reported"
        } else {
            "assumed"
        };
        self.lines.push(format!(
            "Normalized by ln(1+{}) = {:.3} ({basis} headcount)",
            agg.employee_count_used, agg.size_factor
        ));
        self
    }

    pub fn top_event(mut self, events: &[ProcessedEvent]) -> Self {
        let top = events
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.raw_score.total_cmp(&b.raw_score).then(ib.cmp(ia)))
            .map(|(_, e)| e);
        if let Some(e) = top {
            let b = &e.breakdown;
            self.lines.push(format!(
                "Top event: \"{}\" ({}, {}) score {:.3} = source {:.2} x type {:.2} x recency {:.3} ({}d) x impact {:.2}",
                e.title,
                e.event_type,
                if e.source_domain.is_empty() { "unknown source" } else { &e.source_domain },
                e.raw_score,
                b.source_weight,
                b.type_weight,
                b.recency_weight,
                b.age_days,
                b.impact_weight
            ));
        }
        self
    }

    pub fn quadrant(mut self, q: Quadrant, percentile: f64, impact: f64, cutoff: f64) -> Self {
        self.lines.push(format!(
            "{q}: activity percentile {percentile:.1} and impact {impact:.2} against cutoff {cutoff:.0}"
        ));
        self
    }

    pub fn build(self) -> Vec<String> {
        self.lines
    }
}
