//! Competitive Radar: binary entrypoint
//! Boots the Axum HTTP server: watch-list store, score cache, scoring
//! configuration, Exa search ingestion, Prometheus metrics and the periodic
//! scoring job.

use shuttle_axum::ShuttleAxum;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use competitive_radar::api::{create_router, AppState};
use competitive_radar::cache::ttl_secs_from_env;
use competitive_radar::config;
use competitive_radar::ingest::providers::exa::ExaSearchFactory;
use competitive_radar::ingest::scheduler::{
    interval_from_env, provider_timeout_from_env, spawn_scoring_scheduler,
};
use competitive_radar::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - RADAR_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("RADAR_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scoring=info,ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = config::load_default()?;
    let ttl = ttl_secs_from_env();
    let metrics = Metrics::init(ttl)?;

    let mut state = AppState::new(cfg, ttl);
    if let Some(path) = config::resolved_path() {
        state = state.with_config_path(path);
    }
    match ExaSearchFactory::from_env() {
        Some(exa) => state = state.with_providers(Arc::new(exa), provider_timeout_from_env()),
        None => tracing::warn!(target: "ingest", "EXA_API_KEY not set; scoring posted events only"),
    }

    spawn_scoring_scheduler(state.clone(), interval_from_env());

    let router = create_router(state).merge(metrics.router());
    Ok(router.into())
}
