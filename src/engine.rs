//! # Scoring Engine
//! Pure end-to-end pipeline over one batch of companies:
//! dedupe → score events → aggregate per company → rank across the batch →
//! classify → explain.
//!
//! No I/O besides telemetry. Same input, configuration and `now` give
//! bit-identical output.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{self, Aggregate};
use crate::analyze::{process_batch, ProcessedEvent};
use crate::config::ScoringConfiguration;
use crate::dedup::{anon_hash, dedupe};
use crate::ingest::types::RawEvent;
use crate::quadrant;
use crate::rank::rank;
use crate::report::{sample_links, CompanyScoreResult, Explanations};

/// One company's slice of a scoring batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInput {
    pub company_id: u64,
    #[serde(default)]
    pub company_name: String,
    /// Unknown or non-positive → treated as 50.
    #[serde(default)]
    pub employee_count: Option<i64>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

/// Intermediate per-company state, before cross-company ranking.
#[derive(Debug, Clone)]
pub struct CompanyScoring {
    pub company_id: u64,
    pub company_name: String,
    pub employee_count: Option<i64>,
    pub events: Vec<ProcessedEvent>,
    pub dropped_duplicates: usize,
    pub aggregate: Aggregate,
    pub impact: f64,
    pub confidence: f64,
    pub momentum: f64,
}

/// Everything that only depends on a single company.
pub fn score_company(
    input: CompanyInput,
    cfg: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> CompanyScoring {
    let received = input.events.len();
    let unique = dedupe(input.events);
    let dropped_duplicates = received - unique.len();

    let events = process_batch(input.company_id, unique, cfg, now);
    let agg = aggregate::aggregate(&events, input.employee_count);

    let top = events
        .iter()
        .max_by(|a, b| a.raw_score.total_cmp(&b.raw_score))
        .map(|e| anon_hash(&e.title))
        .unwrap_or_default();
    debug!(
        target: "scoring",
        company_id = input.company_id,
        events = events.len(),
        dropped = dropped_duplicates,
        raw = agg.raw_activity,
        stabilized = agg.stabilized,
        normalized = agg.normalized,
        burst = agg.burst.is_some(),
        diversity = agg.diversity_bonus,
        %top,
        "company aggregated"
    );

    CompanyScoring {
        company_id: input.company_id,
        company_name: input.company_name,
        employee_count: input.employee_count,
        impact: aggregate::impact_aggregate(&events),
        confidence: aggregate::confidence_aggregate(&events),
        momentum: aggregate::momentum(&events, input.employee_count, now),
        events,
        dropped_duplicates,
        aggregate: agg,
    }
}

/// Score a batch. Results come back in input order; ranking is relative to
/// this batch only.
pub fn score_batch(
    companies: Vec<CompanyInput>,
    cfg: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> Vec<CompanyScoreResult> {
    crate::metrics::ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let events_in: usize = companies.iter().map(|c| c.events.len()).sum();
    let scored: Vec<CompanyScoring> = companies
        .into_iter()
        .map(|c| score_company(c, cfg, now))
        .collect();

    let activity: Vec<f64> = scored.iter().map(|c| c.aggregate.normalized).collect();
    let ranks = rank(&activity);
    let cutoff = cfg.cutoff();

    let mut dropped = 0usize;
    let results: Vec<CompanyScoreResult> = scored
        .into_iter()
        .zip(ranks)
        .map(|(c, r)| {
            dropped += c.dropped_duplicates;
            let q = quadrant::classify(r.percentile, c.impact, cutoff);
            let explanations = Explanations::new()
                .coverage(&c.events, c.dropped_duplicates)
                .stabilizers(&c.aggregate)
                .size(&c.aggregate, c.employee_count)
                .top_event(&c.events)
                .quadrant(q, r.percentile, c.impact, cutoff)
                .build();
            CompanyScoreResult {
                company_id: c.company_id,
                company_name: c.company_name,
                activity_score: c.aggregate.normalized,
                activity_percentile: r.percentile,
                activity_z_score: r.z_score,
                impact_score: c.impact,
                momentum: c.momentum,
                confidence: c.confidence,
                quadrant: q,
                sample_links: sample_links(&c.events),
                explanations,
            }
        })
        .collect();

    counter!("scoring_runs_total").increment(1);
    counter!("scoring_events_total").increment(events_in as u64);
    counter!("scoring_dedup_total").increment(dropped as u64);
    counter!("scoring_companies_total").increment(results.len() as u64);
    histogram!("scoring_run_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
    gauge!("scoring_last_run_ts").set(now.timestamp() as f64);

    info!(
        target: "scoring",
        companies = results.len(),
        events_in,
        kept = events_in - dropped,
        dropped,
        "batch scored"
    );

    results
}
