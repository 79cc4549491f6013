// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scoring_runs_total", "Scoring batches executed.");
        describe_counter!("scoring_events_total", "Raw events received by the scorer.");
        describe_counter!("scoring_dedup_total", "Events dropped as duplicates.");
        describe_counter!("scoring_companies_total", "Companies scored.");
        describe_histogram!("scoring_run_ms", "Batch scoring time in milliseconds.");
        describe_gauge!("scoring_last_run_ts", "Unix ts of the last scoring run.");
        describe_counter!("ingest_events_total", "Events parsed from provider responses.");
        describe_histogram!("ingest_parse_ms", "Provider parse time in milliseconds.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors and timeouts."
        );
        describe_gauge!("scores_cache_ttl_secs", "Score cache TTL in seconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the cache TTL as a static gauge.
    pub fn init(cache_ttl_secs: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        ensure_metrics_described();
        // absolute TTL, no sliding refresh
        gauge!("scores_cache_ttl_secs").set(cache_ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
