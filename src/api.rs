// src/api.rs
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::cache::{cache_key, ScoreCache};
use crate::config::{self, ScoringConfiguration};
use crate::dedup::dedupe;
use crate::digest::{render_weekly, Report, WeeklyReportRequest};
use crate::engine::{score_batch, CompanyInput};
use crate::ingest::providers::ProviderFactory;
use crate::ingest::scheduler::DEFAULT_PROVIDER_TIMEOUT_SECS;
use crate::ingest::types::RawEvent;
use crate::ingest::{collect, within_lookback};
use crate::report::CompanyScoreResult;
use crate::signals::{dominant_type, signal_for, Signal};
use crate::source_weights::{classify, extract_domain, weight_for_class};
use crate::store::{Company, CompanyUpdate, NewCompany, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub cache: Arc<ScoreCache>,
    pub config: Arc<RwLock<ScoringConfiguration>>,
    /// Where `/admin/reload-config` reads from; `None` → env/default discovery.
    pub config_path: Option<PathBuf>,
    /// Refreshes company events before a watch-list run; `None` scores only
    /// what was posted to `/vendors/{id}/events`.
    pub providers: Option<Arc<dyn ProviderFactory>>,
    pub provider_timeout: Duration,
}

impl AppState {
    pub fn new(cfg: ScoringConfiguration, cache_ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(Store::new()),
            cache: Arc::new(ScoreCache::new(cache_ttl_secs)),
            config: Arc::new(RwLock::new(cfg)),
            config_path: None,
            providers: None,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }

    pub fn with_providers(mut self, factory: Arc<dyn ProviderFactory>, timeout: Duration) -> Self {
        self.providers = Some(factory);
        self.provider_timeout = timeout;
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn config_snapshot(&self) -> ScoringConfiguration {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn replace_config(&self, cfg: ScoringConfiguration) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = cfg;
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/vendors/watch", post(create_watch))
        .route("/vendors", get(list_vendors))
        .route("/vendors/{id}", get(get_vendor).put(update_vendor))
        .route("/vendors/{id}/events", post(append_vendor_events))
        .route("/score", post(score))
        .route("/run/watchlist", post(run_watchlist_handler))
        .route("/scores", get(cached_scores))
        .route("/signals", get(list_signals))
        .route("/reports/weekly", post(weekly_report))
        .route("/reports", get(list_reports))
        .route("/debug/source-weight", get(debug_source_weight))
        .route("/admin/reload-config", post(admin_reload_config))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Result of scoring stored companies.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_at: DateTime<Utc>,
    pub cache_key: String,
    pub companies_scored: usize,
    pub events_fetched: usize,
    pub signals_created: usize,
    pub results: Vec<CompanyScoreResult>,
}

/// Score stored companies (all when `ids` is `None`).
///
/// Pulls fresh events from the configured providers, prunes each company's
/// pending events to the deduplicated lookback window, scores, refreshes the
/// cache, records one signal per company with events and stamps the watches.
/// Results are sorted by activity score, descending.
pub async fn run_watchlist(
    state: &AppState,
    ids: Option<&[u64]>,
    now: DateTime<Utc>,
) -> RunSummary {
    let cfg = state.config_snapshot();
    let key = cache_key(&cfg);
    let companies = state.store.select_companies(ids);

    let mut events_fetched = 0;
    if let Some(factory) = &state.providers {
        let since = now - ChronoDuration::days(i64::from(cfg.lookback_window_days));
        for c in &companies {
            let providers = factory.providers_for(c, since);
            let fresh = collect(&providers, state.provider_timeout).await;
            events_fetched += fresh.len();
            state.store.append_events(c.id, fresh);
        }
    }
    for c in &companies {
        state
            .store
            .compact_events(c.id, |evs| dedupe(within_lookback(evs, &cfg, now)));
    }

    let inputs: Vec<CompanyInput> = state.store.company_inputs(ids);
    let dominant: HashMap<u64, _> = inputs
        .iter()
        .map(|c| (c.company_id, dominant_type(&c.events)))
        .collect();

    let mut results = score_batch(inputs, &cfg, now);
    let mut signals_created = 0;
    for r in &results {
        state.cache.put(&key, r.clone(), now);
        state.store.mark_run(r.company_id, now);
        if let Some(sig) = signal_for(r, dominant.get(&r.company_id).copied().flatten()) {
            state.store.create_signal(sig, now);
            signals_created += 1;
        }
    }
    let purged = state.cache.purge_expired(now);
    CompanyScoreResult::sort_by_activity(&mut results);

    info!(
        target: "api",
        companies = results.len(),
        events_fetched,
        signals_created,
        %key,
        purged,
        "watch list scored"
    );

    RunSummary {
        run_at: now,
        cache_key: key,
        companies_scored: results.len(),
        events_fetched,
        signals_created,
        results,
    }
}

async fn create_watch(
    State(state): State<AppState>,
    Json(body): Json<NewCompany>,
) -> Result<Json<Company>, StatusCode> {
    if body.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let (company, watch) = state.store.create_company(body, Utc::now());
    info!(target: "api", company_id = company.id, watch_id = watch.id, "company watched");
    Ok(Json(company))
}

async fn list_vendors(State(state): State<AppState>) -> Json<Vec<Company>> {
    Json(state.store.list_companies())
}

async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Company>, StatusCode> {
    state
        .store
        .get_company(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<CompanyUpdate>,
) -> Result<Json<Company>, StatusCode> {
    state
        .store
        .update_company(id, body)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Serialize)]
struct AppendOut {
    company_id: u64,
    pending: usize,
}

async fn append_vendor_events(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(events): Json<Vec<RawEvent>>,
) -> Result<Json<AppendOut>, StatusCode> {
    let pending = state
        .store
        .append_events(id, events)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(AppendOut {
        company_id: id,
        pending,
    }))
}

#[derive(Deserialize)]
struct ScoreReq {
    companies: Vec<CompanyInput>,
    /// Reference time; defaults to the server clock.
    #[serde(default)]
    now: Option<DateTime<Utc>>,
}

async fn score(
    State(state): State<AppState>,
    Json(body): Json<ScoreReq>,
) -> Json<Vec<CompanyScoreResult>> {
    let cfg = state.config_snapshot();
    let now = body.now.unwrap_or_else(Utc::now);
    let inputs = body
        .companies
        .into_iter()
        .map(|mut c| {
            c.events = within_lookback(c.events, &cfg, now);
            c
        })
        .collect();
    let mut results = score_batch(inputs, &cfg, now);
    CompanyScoreResult::sort_by_activity(&mut results);
    Json(results)
}

#[derive(Deserialize, Default)]
struct RunReq {
    #[serde(default)]
    company_ids: Option<Vec<u64>>,
}

async fn run_watchlist_handler(
    State(state): State<AppState>,
    Json(body): Json<RunReq>,
) -> Json<RunSummary> {
    Json(run_watchlist(&state, body.company_ids.as_deref(), Utc::now()).await)
}

async fn cached_scores(State(state): State<AppState>) -> Json<Vec<CompanyScoreResult>> {
    let key = cache_key(&state.config_snapshot());
    let mut out = state.cache.latest_for_key(&key, Utc::now());
    CompanyScoreResult::sort_by_activity(&mut out);
    Json(out)
}

#[derive(Deserialize)]
struct SignalQuery {
    #[serde(default)]
    company_id: Option<u64>,
}

async fn list_signals(
    State(state): State<AppState>,
    Query(q): Query<SignalQuery>,
) -> Json<Vec<Signal>> {
    Json(state.store.list_signals(q.company_id))
}

async fn weekly_report(
    State(state): State<AppState>,
    Json(req): Json<WeeklyReportRequest>,
) -> Result<Json<Report>, (StatusCode, String)> {
    if req.period_end < req.period_start {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "period_end is before period_start".to_string(),
        ));
    }
    let signals = state.store.list_signals(None);
    let draft = render_weekly(&req, &signals, |id| {
        state.store.get_company(id).map(|c| c.name)
    });
    let report = state.store.create_report(draft, Utc::now());
    info!(
        target: "api",
        report_id = report.id,
        urls = report.url_list.len(),
        "weekly report generated"
    );
    Ok(Json(report))
}

async fn list_reports(State(state): State<AppState>) -> Json<Vec<Report>> {
    Json(state.store.list_reports())
}

#[derive(Serialize)]
struct SourceWeightOut {
    url: String,
    domain: String,
    class: String,
    weight: f64,
}

async fn debug_source_weight(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<SourceWeightOut> {
    let url = q.get("url").cloned().unwrap_or_default();
    let cfg = state.config_snapshot();
    let domain = extract_domain(&url).to_string();
    let class = classify(&domain, &cfg);
    Json(SourceWeightOut {
        weight: weight_for_class(&class, &cfg),
        class: class.label().to_string(),
        domain,
        url,
    })
}

#[derive(Serialize)]
struct ReloadOut {
    cache_key: String,
}

async fn admin_reload_config(
    State(state): State<AppState>,
) -> Result<Json<ReloadOut>, (StatusCode, String)> {
    let path = state.config_path.clone().or_else(config::resolved_path);
    let fresh = match &path {
        Some(p) => config::load_from(p),
        None => Ok(ScoringConfiguration::default()),
    };
    match fresh {
        Ok(cfg) => {
            let key = cache_key(&cfg);
            state.replace_config(cfg);
            info!(target: "api", %key, "scoring config reloaded");
            Ok(Json(ReloadOut { cache_key: key }))
        }
        Err(e) => {
            warn!(target: "api", error = %e, "config reload rejected, keeping previous");
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}
