// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::analyze::scoring::parse_timestamp;
use crate::config::ScoringConfiguration;
use crate::ingest::types::{EventType, RawEvent, SourceProvider};

const MAX_TITLE_CHARS: usize = 500;

/// Normalize a provider title: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    if let Ok(re) = RE_TAGS.get_or_try_init(|| regex::Regex::new(r"(?is)</?[^>]+>")) {
        out = re.replace_all(&out, "").to_string();
    }

    // 3) Curly quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    out = out.split_whitespace().collect::<Vec<_>>().join(" ");

    if out.chars().count() > MAX_TITLE_CHARS {
        out = out.chars().take(MAX_TITLE_CHARS).collect();
    }
    out
}

/// One search result as the provider returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "publishedDate")]
    pub published_date: Option<String>,
}

/// Turn provider hits into raw events of one type. Hits without a usable
/// title or URL are dropped.
pub fn parse_hits(hits: Vec<ProviderHit>, event_type: EventType) -> Vec<RawEvent> {
    hits.into_iter()
        .filter_map(|h| {
            let title = normalize_text(h.title.as_deref().unwrap_or_default());
            let url = h.url.unwrap_or_default().trim().to_string();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(RawEvent::new(title, url, h.published_date, event_type))
        })
        .collect()
}

/// Drop events older than the lookback window. Events without a parsable
/// timestamp are kept.
pub fn within_lookback(
    events: Vec<RawEvent>,
    cfg: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> Vec<RawEvent> {
    let horizon = now - ChronoDuration::days(i64::from(cfg.lookback_window_days));
    events
        .into_iter()
        .filter(|e| {
            e.published_at
                .as_deref()
                .and_then(parse_timestamp)
                .map_or(true, |ts| ts >= horizon)
        })
        .collect()
}

/// Fetch from all providers concurrently, each bounded by `timeout`.
/// Failing or slow providers are logged and skipped; output keeps provider order.
pub async fn collect(providers: &[Arc<dyn SourceProvider>], timeout: Duration) -> Vec<RawEvent> {
    crate::metrics::ensure_metrics_described();

    let mut set = JoinSet::new();
    for (idx, p) in providers.iter().enumerate() {
        let p = Arc::clone(p);
        set.spawn(async move {
            let name = p.name();
            (idx, name, tokio::time::timeout(timeout, p.fetch_events()).await)
        });
    }

    let mut batches: Vec<(usize, Vec<RawEvent>)> = Vec::with_capacity(providers.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, _, Ok(Ok(events)))) => batches.push((idx, events)),
            Ok((_, name, Ok(Err(e)))) => {
                tracing::warn!(target: "ingest", error = ?e, provider = name, "provider error");
                counter!("ingest_provider_errors_total").increment(1);
            }
            Ok((_, name, Err(_))) => {
                tracing::warn!(target: "ingest", provider = name, ?timeout, "provider timed out");
                counter!("ingest_provider_errors_total").increment(1);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, "provider task failed");
                counter!("ingest_provider_errors_total").increment(1);
            }
        }
    }

    batches.sort_by_key(|(idx, _)| *idx);
    let out: Vec<RawEvent> = batches.into_iter().flat_map(|(_, v)| v).collect();
    tracing::info!(target: "ingest", providers = providers.len(), events = out.len(), "collected");
    out
}
