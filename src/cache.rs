//! Time-boxed cache of per-company results.
//!
//! Entries are keyed by `(company_id, cache_key)` where the key fingerprints
//! the configuration the result was computed with. Expiry is absolute
//! (`inserted + ttl`); reads never extend it.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::ScoringConfiguration;
use crate::dedup::anon_hash;
use crate::report::CompanyScoreResult;

pub const ENV_SCORES_CACHE_TTL_SECS: &str = "SCORES_CACHE_TTL_SECS";
pub const DEFAULT_TTL_SECS: u64 = 3600;
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Short fingerprint of a configuration snapshot.
pub fn cache_key(cfg: &ScoringConfiguration) -> String {
    // BTreeMap fields keep this stable across runs.
    let json = serde_json::to_string(cfg).unwrap_or_default();
    anon_hash(&json)
}

/// `SCORES_CACHE_TTL_SECS` or the default; junk falls back to the default.
pub fn ttl_secs_from_env() -> u64 {
    std::env::var(ENV_SCORES_CACHE_TTL_SECS)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_TTL_SECS)
}

#[derive(Debug, Clone)]
struct Entry {
    result: CompanyScoreResult,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ScoreCache {
    ttl: Duration,
    entries: Mutex<HashMap<(u64, String), Entry>>,
}

impl ScoreCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(u64, String), Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn put(&self, key: &str, result: CompanyScoreResult, now: DateTime<Utc>) {
        let expires_at = now + self.ttl;
        self.lock().insert(
            (result.company_id, key.to_string()),
            Entry { result, expires_at },
        );
    }

    /// Live entry or `None`; an expired entry is evicted on the way.
    pub fn get(&self, company_id: u64, key: &str, now: DateTime<Utc>) -> Option<CompanyScoreResult> {
        let mut map = self.lock();
        let k = (company_id, key.to_string());
        let expired = match map.get(&k) {
            Some(e) if now < e.expires_at => return Some(e.result.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            map.remove(&k);
        }
        None
    }

    /// All live results computed under `key`, ordered by company id.
    pub fn latest_for_key(&self, key: &str, now: DateTime<Utc>) -> Vec<CompanyScoreResult> {
        let map = self.lock();
        let mut out: Vec<CompanyScoreResult> = map
            .iter()
            .filter(|((_, k), e)| k == key && now < e.expires_at)
            .map(|(_, e)| e.result.clone())
            .collect();
        out.sort_by_key(|r| r.company_id);
        out
    }

    /// Drop everything expired; returns how many entries went.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, e| now < e.expires_at);
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
