// src/config/scoring.rs
//! Scoring policy snapshot.
//!
//! One `ScoringConfiguration` is loaded (and validated) per run and handed to
//! the engine by reference; nothing in the core mutates it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const TIER1_TECH_MEDIA: &str = "tier1_tech_media";
pub const COMPANY_BLOG: &str = "company_blog";
pub const LOW_TIER_AGGREGATOR: &str = "low_tier_aggregator";

fn default_credibility() -> BTreeMap<String, f64> {
    BTreeMap::from([
        (TIER1_TECH_MEDIA.to_string(), 1.0),
        (COMPANY_BLOG.to_string(), 0.9),
        (LOW_TIER_AGGREGATOR.to_string(), 0.5),
    ])
}

fn default_type_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("product".to_string(), 1.0),
        ("funding".to_string(), 0.9),
        ("press".to_string(), 0.6),
        ("security".to_string(), 0.8),
    ])
}

fn default_half_life() -> f64 {
    60.0
}
fn default_lookback() -> u32 {
    180
}
fn default_cutoff() -> u8 {
    60
}
fn default_event_confidence() -> f64 {
    0.8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfiguration {
    /// Domain class or exact domain → weight in [0,1].
    #[serde(default = "default_credibility")]
    pub source_credibility_weights: BTreeMap<String, f64>,
    /// Event type key (`product`, `funding`, ...) → weight.
    #[serde(default = "default_type_weights")]
    pub event_type_weights: BTreeMap<String, f64>,
    #[serde(default = "default_half_life")]
    pub recency_half_life_days: f64,
    /// Enforced by the ingest boundary, never by the engine.
    #[serde(default = "default_lookback")]
    pub lookback_window_days: u32,
    #[serde(default = "default_cutoff")]
    pub quadrant_cutoff_percentile: u8,
    /// Constant per-event confidence policy.
    #[serde(default = "default_event_confidence")]
    pub event_confidence: f64,
}

impl Default for ScoringConfiguration {
    fn default() -> Self {
        Self {
            source_credibility_weights: default_credibility(),
            event_type_weights: default_type_weights(),
            recency_half_life_days: default_half_life(),
            lookback_window_days: default_lookback(),
            quadrant_cutoff_percentile: default_cutoff(),
            event_confidence: default_event_confidence(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("recency_half_life_days must be a positive finite number, got {0}")]
    NonPositiveHalfLife(f64),
    #[error("quadrant_cutoff_percentile must be within 0..=100, got {0}")]
    CutoffOutOfRange(u8),
    #[error("source credibility weight for `{key}` must be within [0,1], got {value}")]
    WeightOutOfRange { key: String, value: f64 },
    #[error("event type weight for `{key}` must be finite and >= 0, got {value}")]
    NegativeTypeWeight { key: String, value: f64 },
    #[error("event_confidence must be within [0,1], got {0}")]
    ConfidenceOutOfRange(f64),
    #[error("reading scoring config from {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing scoring config from {path}: {message}")]
    Parse { path: String, message: String },
}

impl ScoringConfiguration {
    /// Reject snapshots the engine cannot evaluate meaningfully.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hl = self.recency_half_life_days;
        if !(hl.is_finite() && hl > 0.0) {
            return Err(ConfigError::NonPositiveHalfLife(hl));
        }
        if self.quadrant_cutoff_percentile > 100 {
            return Err(ConfigError::CutoffOutOfRange(self.quadrant_cutoff_percentile));
        }
        for (key, &value) in &self.source_credibility_weights {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange {
                    key: key.clone(),
                    value,
                });
            }
        }
        for (key, &value) in &self.event_type_weights {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeTypeWeight {
                    key: key.clone(),
                    value,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.event_confidence) {
            return Err(ConfigError::ConfidenceOutOfRange(self.event_confidence));
        }
        Ok(())
    }

    /// Credibility weight for a class key, with the built-in default as fallback.
    pub fn class_weight(&self, class: &str) -> f64 {
        self.source_credibility_weights
            .get(class)
            .copied()
            .or_else(|| default_credibility().get(class).copied())
            .unwrap_or(0.5)
    }

    pub fn cutoff(&self) -> f64 {
        f64::from(self.quadrant_cutoff_percentile)
    }
}
