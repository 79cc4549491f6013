// src/analyze/mod.rs
//! Per-event analysis: impact heuristic and the four-factor event scorer.

pub mod impact;
pub mod scoring;

pub use crate::analyze::impact::impact_weight;
pub use crate::analyze::scoring::{
    process, recency_decay, score, ProcessedEvent, ScoreBreakdown,
};

use chrono::{DateTime, Utc};

use crate::config::ScoringConfiguration;
use crate::ingest::types::RawEvent;

/// Score a company's (already deduplicated) events, preserving order.
pub fn process_batch(
    company_id: u64,
    events: Vec<RawEvent>,
    cfg: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> Vec<ProcessedEvent> {
    events
        .into_iter()
        .map(|ev| process(company_id, ev, cfg, now))
        .collect()
}
