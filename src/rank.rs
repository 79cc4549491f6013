//! Cross-company ranking within one batch.
//!
//! - z-score: `(x - mean) / (population stddev + 1e-9)`; batches of one → 0.0
//! - percentile: `count(scores <= x) / n * 100`; ties share a percentile and
//!   the maximum always reaches 100.

use serde::Serialize;

const STDDEV_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rank {
    pub z_score: f64,
    pub percentile: f64,
}

pub fn z_scores(scores: &[f64]) -> Vec<f64> {
    if scores.len() <= 1 {
        return vec![0.0; scores.len()];
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt() + STDDEV_EPSILON;
    scores.iter().map(|s| (s - mean) / std_dev).collect()
}

pub fn percentiles(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    scores
        .iter()
        .map(|s| {
            let at_or_below = sorted.partition_point(|x| x <= s);
            at_or_below as f64 / n * 100.0
        })
        .collect()
}

/// z-score and percentile per input position.
pub fn rank(scores: &[f64]) -> Vec<Rank> {
    z_scores(scores)
        .into_iter()
        .zip(percentiles(scores))
        .map(|(z_score, percentile)| Rank {
            z_score,
            percentile,
        })
        .collect()
}
