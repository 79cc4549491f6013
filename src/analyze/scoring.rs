//! Event scorer.
//!
//! `raw_score = source_weight * type_weight * recency_weight * impact_weight`
//!
//! - `source_weight`  : credibility of the publishing domain (`source_weights`)
//! - `type_weight`    : `event_type_weights[type]`, 1.0 when absent
//! - `recency_weight` : `exp(-ln(2) / half_life * age_days)`, whole days, never negative age
//! - `impact_weight`  : keyword heuristic (`impact`)
//!
//! Pure per event; safe to map in parallel over a batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::f64::consts::LN_2;

use super::impact::impact_weight;
use crate::config::ScoringConfiguration;
use crate::dedup::content_hash;
use crate::ingest::types::{EventType, RawEvent};
use crate::source_weights::{extract_domain, weight_for_domain};

/// Canonical record after dedup + scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedEvent {
    pub company_id: u64,
    pub event_type: EventType,
    pub title: String,
    pub url: String,
    pub source_domain: String,
    /// Event time; processing time when the raw timestamp was missing or unparsable.
    pub timestamp: DateTime<Utc>,
    pub content_hash: String,
    pub raw_score: f64,
    pub impact_score: f64,
    pub confidence: f64,
    #[serde(skip)]
    pub breakdown: ScoreBreakdown,
}

/// The four factors behind one raw score, kept for explanations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub source_weight: f64,
    pub type_weight: f64,
    pub recency_weight: f64,
    pub impact_weight: f64,
    pub age_days: i64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        non_negative(self.source_weight * self.type_weight * self.recency_weight * self.impact_weight)
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// ISO-8601 timestamps: RFC 3339 with `Z` or offset, then offset-less
/// date-times and plain dates, both read as UTC. Anything else is unknown.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Whole days between `ts` and `now`, clamped at zero (future events do not boost).
pub fn age_days_between(ts: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - ts).num_days().max(0)
}

/// Age of a raw timestamp string; missing or unparsable → 0 (no decay).
pub fn age_days(published_at: Option<&str>, now: DateTime<Utc>) -> i64 {
    published_at
        .and_then(parse_timestamp)
        .map(|ts| age_days_between(ts, now))
        .unwrap_or(0)
}

pub fn recency_decay(age_days: f64, half_life_days: f64) -> f64 {
    let lambda = LN_2 / half_life_days;
    (-lambda * age_days).exp()
}

pub fn type_weight(event_type: EventType, cfg: &ScoringConfiguration) -> f64 {
    cfg.event_type_weights
        .get(event_type.as_str())
        .copied()
        .unwrap_or(1.0)
}

/// Factor breakdown for `event` scored as `event_type`.
pub fn breakdown(
    event: &RawEvent,
    event_type: EventType,
    cfg: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let age = age_days(event.published_at.as_deref(), now);
    ScoreBreakdown {
        source_weight: weight_for_domain(extract_domain(&event.url), cfg),
        type_weight: type_weight(event_type, cfg),
        recency_weight: recency_decay(age as f64, cfg.recency_half_life_days),
        impact_weight: impact_weight(&event.title, event_type),
        age_days: age,
    }
}

/// Raw score of one event. Always >= 0.
pub fn score(
    event: &RawEvent,
    event_type: EventType,
    cfg: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> f64 {
    breakdown(event, event_type, cfg, now).total()
}

/// Turn a (deduplicated) raw event into its canonical scored record.
pub fn process(
    company_id: u64,
    event: RawEvent,
    cfg: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> ProcessedEvent {
    let b = breakdown(&event, event.event_type, cfg, now);
    let timestamp = event
        .published_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let hash = event
        .content_hash
        .clone()
        .unwrap_or_else(|| content_hash(&event.title, &event.url));
    let source_domain = extract_domain(&event.url).to_string();

    ProcessedEvent {
        company_id,
        event_type: event.event_type,
        title: event.title,
        url: event.url,
        source_domain,
        timestamp,
        content_hash: hash,
        raw_score: b.total(),
        impact_score: b.impact_weight,
        confidence: cfg.event_confidence,
        breakdown: b,
    }
}

fn non_negative(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        0.0
    } else {
        x
    }
}
