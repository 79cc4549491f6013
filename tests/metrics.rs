// tests/metrics.rs
#![cfg(feature = "strict-metrics")]
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusBuilder;

use competitive_radar::config::ScoringConfiguration;
use competitive_radar::engine::{score_batch, CompanyInput};
use competitive_radar::ingest::types::{EventType, RawEvent};

#[test]
fn scoring_series_exposed_after_a_run() {
    let handle = PrometheusBuilder::new().install_recorder().expect("recorder");

    let ev = RawEvent::new("Launch", "https://wired.com/a", None, EventType::Product);
    let _ = score_batch(
        vec![CompanyInput {
            company_id: 1,
            company_name: "Acme".into(),
            employee_count: None,
            events: vec![ev.clone(), ev],
        }],
        &ScoringConfiguration::default(),
        Utc::now(),
    );

    let out = handle.render();
    for needle in [
        "scoring_runs_total",
        "scoring_events_total",
        "scoring_dedup_total",
        "scoring_companies_total",
        "scoring_run_ms",
        "scoring_last_run_ts",
    ] {
        assert!(out.contains(needle), "metrics exposition missing '{needle}'\n{out}");
    }
}
