// src/ingest/scheduler.rs
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{run_watchlist, AppState};

pub const ENV_SCORING_INTERVAL_SECS: &str = "SCORING_INTERVAL_SECS";
pub const DEFAULT_INTERVAL_SECS: u64 = 86_400;
pub const ENV_PROVIDER_TIMEOUT_SECS: &str = "INGEST_PROVIDER_TIMEOUT_SECS";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

fn secs_from_env(var: &str, default: u64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&s| s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// `SCORING_INTERVAL_SECS`, falling back to daily; zero is treated as unset.
pub fn interval_from_env() -> Duration {
    secs_from_env(ENV_SCORING_INTERVAL_SECS, DEFAULT_INTERVAL_SECS)
}

/// Per-provider fetch budget, `INGEST_PROVIDER_TIMEOUT_SECS` or 30 s.
pub fn provider_timeout_from_env() -> Duration {
    secs_from_env(ENV_PROVIDER_TIMEOUT_SECS, DEFAULT_PROVIDER_TIMEOUT_SECS)
}

/// Periodically score the whole watch list. The first tick fires immediately.
pub fn spawn_scoring_scheduler(state: AppState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let summary = run_watchlist(&state, None, chrono::Utc::now()).await;
            tracing::info!(
                target: "ingest",
                companies = summary.companies_scored,
                fetched = summary.events_fetched,
                key = %summary.cache_key,
                "scheduled scoring tick"
            );
        }
    })
}
