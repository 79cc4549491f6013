//! # Company Aggregator
//! Reduces one company's processed events into an activity score.
//!
//! 1. raw activity = Σ raw_score
//! 2. burst penalty: heaviest ISO week > 50% of the total → × 0.9
//! 3. diversity bonus: ≥ 3 distinct event types → × 1.05
//! 4. size normalization: ÷ ln(1 + employees), unknown/non-positive headcount → 50
//!
//! Also hosts the auxiliary per-company aggregates (impact, confidence,
//! momentum). Nothing here fails; empty input yields zeros.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyze::scoring::{age_days_between, ProcessedEvent};
use crate::ingest::types::EventType;

pub const BURST_SHARE_THRESHOLD: f64 = 0.5;
pub const BURST_PENALTY: f64 = 0.9;
const BURST_EPSILON: f64 = 1e-6;

pub const DIVERSITY_MIN_TYPES: usize = 3;
pub const DIVERSITY_BONUS: f64 = 1.05;

pub const DEFAULT_EMPLOYEE_COUNT: i64 = 50;

pub const MOMENTUM_WINDOW_DAYS: i64 = 7;

/// Heaviest ISO week and its share of the company's total raw score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekShare {
    pub iso_year: i32,
    pub iso_week: u32,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub raw_activity: f64,
    pub stabilized: f64,
    pub normalized: f64,
    /// Set when the burst penalty fired.
    pub burst: Option<WeekShare>,
    pub diversity_bonus: bool,
    pub distinct_types: usize,
    pub size_factor: f64,
    pub employee_count_used: i64,
}

pub fn raw_activity(events: &[ProcessedEvent]) -> f64 {
    events.iter().map(|e| e.raw_score).sum()
}

/// Sum of raw scores per (ISO year, ISO week), in calendar order.
pub fn weekly_totals(events: &[ProcessedEvent]) -> BTreeMap<(i32, u32), f64> {
    let mut weeks: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for e in events {
        let w = e.timestamp.iso_week();
        *weeks.entry((w.year(), w.week())).or_insert(0.0) += e.raw_score;
    }
    weeks
}

/// Heaviest week (earliest wins a tie), or `None` for an empty set.
pub fn heaviest_week(events: &[ProcessedEvent]) -> Option<WeekShare> {
    let weeks = weekly_totals(events);
    let total: f64 = weeks.values().sum();
    let mut best: Option<((i32, u32), f64)> = None;
    for (&k, &v) in &weeks {
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((k, v));
        }
    }
    best.map(|((iso_year, iso_week), max)| WeekShare {
        iso_year,
        iso_week,
        share: max / (total + BURST_EPSILON),
    })
}

pub fn distinct_types(events: &[ProcessedEvent]) -> BTreeSet<EventType> {
    events.iter().map(|e| e.event_type).collect()
}

/// Burst penalty + diversity bonus. Returns the stabilized score and the
/// week that triggered the penalty, if any.
pub fn apply_stabilizers(raw: f64, events: &[ProcessedEvent]) -> (f64, Option<WeekShare>, bool) {
    if events.is_empty() {
        return (raw, None, false);
    }
    let mut score = raw;

    let burst = heaviest_week(events).filter(|w| w.share > BURST_SHARE_THRESHOLD);
    if burst.is_some() {
        score *= BURST_PENALTY;
    }

    let diverse = distinct_types(events).len() >= DIVERSITY_MIN_TYPES;
    if diverse {
        score *= DIVERSITY_BONUS;
    }

    (score, burst, diverse)
}

/// `ln(1 + n)` with the headcount actually used.
pub fn size_factor(employee_count: Option<i64>) -> (f64, i64) {
    let n = match employee_count {
        Some(n) if n > 0 => n,
        _ => DEFAULT_EMPLOYEE_COUNT,
    };
    ((n as f64).ln_1p(), n)
}

pub fn normalize_by_size(score: f64, employee_count: Option<i64>) -> f64 {
    score / size_factor(employee_count).0
}

pub fn aggregate(events: &[ProcessedEvent], employee_count: Option<i64>) -> Aggregate {
    let raw = raw_activity(events);
    let (stabilized, burst, diversity_bonus) = apply_stabilizers(raw, events);
    let (factor, used) = size_factor(employee_count);
    Aggregate {
        raw_activity: raw,
        stabilized,
        normalized: stabilized / factor,
        burst,
        diversity_bonus,
        distinct_types: distinct_types(events).len(),
        size_factor: factor,
        employee_count_used: used,
    }
}

/// Unnormalized impact: Σ per-event impact weight.
pub fn impact_aggregate(events: &[ProcessedEvent]) -> f64 {
    events.iter().map(|e| e.impact_score).sum()
}

/// Mean per-event confidence; 0.0 when there is nothing to be confident about.
pub fn confidence_aggregate(events: &[ProcessedEvent]) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    events.iter().map(|e| e.confidence).sum::<f64>() / events.len() as f64
}

/// Placeholder momentum: raw activity of the last 7 whole days minus the 7
/// days before that, scaled by the same size factor as the activity score.
pub fn momentum(events: &[ProcessedEvent], employee_count: Option<i64>, now: DateTime<Utc>) -> f64 {
    let mut current = 0.0;
    let mut previous = 0.0;
    for e in events {
        let age = age_days_between(e.timestamp, now);
        if age < MOMENTUM_WINDOW_DAYS {
            current += e.raw_score;
        } else if age < 2 * MOMENTUM_WINDOW_DAYS {
            previous += e.raw_score;
        }
    }
    normalize_by_size(current - previous, employee_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::scoring::ScoreBreakdown;
    use chrono::{Duration, TimeZone};

    fn monday() -> DateTime<Utc> {
        // 2025-06-02 is a Monday (ISO week 23)
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    fn pe(ts: DateTime<Utc>, ty: EventType, raw: f64) -> ProcessedEvent {
        ProcessedEvent {
            company_id: 1,
            event_type: ty,
            title: String::new(),
            url: String::new(),
            source_domain: String::new(),
            timestamp: ts,
            content_hash: String::new(),
            raw_score: raw,
            impact_score: 1.0,
            confidence: 0.8,
            breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn empty_set_is_all_zero() {
        let a = aggregate(&[], None);
        assert_eq!(a.raw_activity, 0.0);
        assert_eq!(a.stabilized, 0.0);
        assert_eq!(a.normalized, 0.0);
        assert!(a.burst.is_none());
        assert!(!a.diversity_bonus);
        assert_eq!(impact_aggregate(&[]), 0.0);
        assert_eq!(confidence_aggregate(&[]), 0.0);
    }

    #[test]
    fn single_week_burst_is_penalized() {
        let events: Vec<_> = (0..10)
            .map(|i| pe(monday() + Duration::hours(i * 12), EventType::Product, 1.0))
            .collect();
        let a = aggregate(&events, None);
        assert_eq!(a.raw_activity, 10.0);
        assert_eq!(a.stabilized, 10.0 * BURST_PENALTY);
        let w = a.burst.expect("burst");
        assert_eq!((w.iso_year, w.iso_week), (2025, 23));
    }

    #[test]
    fn spread_weeks_are_not_penalized() {
        let events: Vec<_> = (0..10)
            .map(|i| pe(monday() - Duration::weeks(i), EventType::Product, 1.0))
            .collect();
        let a = aggregate(&events, None);
        assert_eq!(a.stabilized, a.raw_activity);
        assert!(a.burst.is_none());
    }

    #[test]
    fn exactly_half_does_not_trigger() {
        let events = vec![
            pe(monday(), EventType::Press, 1.0),
            pe(monday() - Duration::weeks(1), EventType::Press, 1.0),
        ];
        let (s, burst, _) = apply_stabilizers(2.0, &events);
        assert_eq!(s, 2.0);
        assert!(burst.is_none());
    }

    #[test]
    fn all_zero_scores_do_not_trigger_burst() {
        let events = vec![pe(monday(), EventType::Press, 0.0)];
        let (s, burst, _) = apply_stabilizers(0.0, &events);
        assert_eq!(s, 0.0);
        assert!(burst.is_none());
    }

    #[test]
    fn iso_week_boundary_splits_sunday_and_monday() {
        let sunday = monday() - Duration::hours(10);
        let weeks = weekly_totals(&[
            pe(sunday, EventType::Press, 1.0),
            pe(monday(), EventType::Press, 1.0),
        ]);
        assert_eq!(weeks.len(), 2);
    }

    #[test]
    fn diversity_bonus_needs_three_types() {
        let base: Vec<_> = (0..3)
            .map(|i| pe(monday() - Duration::weeks(i), EventType::Funding, 1.0))
            .collect();
        let mut mixed = base.clone();
        mixed[1].event_type = EventType::Press;
        mixed[2].event_type = EventType::Security;

        let two_types = {
            let mut v = base.clone();
            v[1].event_type = EventType::Press;
            v
        };

        assert_eq!(aggregate(&mixed, None).stabilized, 3.0 * DIVERSITY_BONUS);
        assert_eq!(aggregate(&two_types, None).stabilized, 3.0);
        assert_eq!(aggregate(&base, None).stabilized, 3.0);
    }

    #[test]
    fn both_stabilizers_compose() {
        let events = vec![
            pe(monday(), EventType::Product, 1.0),
            pe(monday(), EventType::Press, 1.0),
            pe(monday(), EventType::Security, 1.0),
        ];
        let a = aggregate(&events, None);
        assert_eq!(a.stabilized, 3.0 * BURST_PENALTY * DIVERSITY_BONUS);
    }

    #[test]
    fn size_normalization_defaults_to_fifty() {
        let expected = 50f64.ln_1p();
        assert_eq!(size_factor(None), (expected, 50));
        assert_eq!(size_factor(Some(0)), (expected, 50));
        assert_eq!(size_factor(Some(-5)), (expected, 50));
        assert_eq!(size_factor(Some(999)).1, 999);
        assert!((normalize_by_size(10.0, Some(999)) - 10.0 / 1000f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn bigger_companies_get_smaller_scores() {
        let events = vec![pe(monday(), EventType::Product, 2.0)];
        let small = aggregate(&events, Some(10)).normalized;
        let large = aggregate(&events, Some(10_000)).normalized;
        assert!(small > large);
    }

    #[test]
    fn momentum_is_week_over_week_delta() {
        let now = monday();
        let events = vec![
            pe(now - Duration::days(1), EventType::Press, 2.0),
            pe(now - Duration::days(8), EventType::Press, 0.5),
            pe(now - Duration::days(30), EventType::Press, 9.0),
        ];
        let m = momentum(&events, None, now);
        assert!((m - 1.5 / 50f64.ln_1p()).abs() < 1e-12);
        assert_eq!(momentum(&[], None, now), 0.0);
    }

    #[test]
    fn impact_and_confidence_aggregates() {
        let mut events = vec![
            pe(monday(), EventType::Product, 1.0),
            pe(monday(), EventType::Security, 1.0),
        ];
        events[0].impact_score = 1.5;
        events[1].impact_score = 0.6;
        events[1].confidence = 0.4;
        assert!((impact_aggregate(&events) - 2.1).abs() < 1e-12);
        assert!((confidence_aggregate(&events) - 0.6).abs() < 1e-12);
    }
}
