//! Quadrant classifier: a 2×2 table over (activity percentile, impact score).
//!
//! Both axes use the same inclusive `>= cutoff` test. The impact axis is the
//! raw impact aggregate, not a percentile; callers wanting symmetric
//! boundaries must rescale it to [0,100] first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    #[serde(rename = "Leader")]
    Leader,
    #[serde(rename = "Emerging Disruptor")]
    EmergingDisruptor,
    #[serde(rename = "Sleeping Giant")]
    SleepingGiant,
    #[serde(rename = "Niche/Watch")]
    NicheWatch,
}

impl Quadrant {
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::Leader => "Leader",
            Quadrant::EmergingDisruptor => "Emerging Disruptor",
            Quadrant::SleepingGiant => "Sleeping Giant",
            Quadrant::NicheWatch => "Niche/Watch",
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn classify(activity_percentile: f64, impact_score: f64, cutoff: f64) -> Quadrant {
    let high_activity = activity_percentile >= cutoff;
    let high_impact = impact_score >= cutoff;
    match (high_activity, high_impact) {
        (true, true) => Quadrant::Leader,
        (true, false) => Quadrant::EmergingDisruptor,
        (false, true) => Quadrant::SleepingGiant,
        (false, false) => Quadrant::NicheWatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table_at_sixty() {
        assert_eq!(classify(75.0, 70.0, 60.0), Quadrant::Leader);
        assert_eq!(classify(75.0, 40.0, 60.0), Quadrant::EmergingDisruptor);
        assert_eq!(classify(30.0, 70.0, 60.0), Quadrant::SleepingGiant);
        assert_eq!(classify(30.0, 40.0, 60.0), Quadrant::NicheWatch);
    }

    #[test]
    fn boundary_is_inclusive_on_both_axes() {
        assert_eq!(classify(60.0, 60.0, 60.0), Quadrant::Leader);
        assert_eq!(classify(60.0, 59.999, 60.0), Quadrant::EmergingDisruptor);
    }

    #[test]
    fn unscaled_impact_rarely_reaches_cutoff() {
        // A top-ranked company with a handful of events keeps a small raw
        // impact sum, so it lands in Emerging Disruptor, not Leader.
        assert_eq!(classify(100.0, 4.2, 60.0), Quadrant::EmergingDisruptor);
    }

    #[test]
    fn labels_serialize_verbatim() {
        assert_eq!(
            serde_json::to_string(&Quadrant::NicheWatch).unwrap(),
            "\"Niche/Watch\""
        );
        assert_eq!(Quadrant::EmergingDisruptor.to_string(), "Emerging Disruptor");
    }
}
