//! # Deduplicator
//!
//! Collapses repeated events via a content fingerprint of
//! `lowercase(title).trim() + "|" + lowercase(url).trim()`.
//! Exact matching only: two events collide iff both normalized strings are
//! byte-equal. First occurrence wins, order is preserved.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::ingest::types::RawEvent;

/// Hex SHA-256 over the normalized `title|url` pair.
pub fn content_hash(title: &str, url: &str) -> String {
    let content = format!(
        "{}|{}",
        title.to_lowercase().trim(),
        url.to_lowercase().trim()
    );
    hex_digest(content.as_bytes())
}

pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Short, non-reversible id for log lines (first 6 bytes of SHA-256).
pub(crate) fn anon_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Keep the first event per fingerprint and attach the fingerprint to it.
pub fn dedupe(events: Vec<RawEvent>) -> Vec<RawEvent> {
    let mut seen: HashSet<String> = HashSet::with_capacity(events.len());
    let mut out = Vec::with_capacity(events.len());
    for mut ev in events {
        let hash = content_hash(&ev.title, &ev.url);
        if seen.insert(hash.clone()) {
            ev.content_hash = Some(hash);
            out.push(ev);
        }
    }
    out
}
