// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Kind of company event. Unknown wire values land in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Product,
    Funding,
    Press,
    Security,
    #[serde(other)]
    Other,
}

impl EventType {
    pub const KNOWN: [EventType; 4] = [
        EventType::Product,
        EventType::Funding,
        EventType::Press,
        EventType::Security,
    ];

    /// Key used in `event_type_weights`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Product => "product",
            EventType::Funding => "funding",
            EventType::Press => "press",
            EventType::Security => "security",
            EventType::Other => "other",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event as handed to the scoring core. Transient: lives for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEvent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// ISO-8601 / RFC 3339 string as delivered by the provider; may be absent or junk.
    #[serde(
        default,
        alias = "publishedDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<String>,
    pub event_type: EventType,
    /// Filled in by the deduplicator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl RawEvent {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        published_at: Option<String>,
        event_type: EventType,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            published_at,
            event_type,
            content_hash: None,
        }
    }
}

/// External acquisition of raw events (search/content providers).
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_type_maps_to_other() {
        let ev: RawEvent = serde_json::from_str(
            r#"{"title":"x","url":"https://a/b","event_type":"hiring"}"#,
        )
        .unwrap();
        assert_eq!(ev.event_type, EventType::Other);
        assert!(ev.published_at.is_none());
    }

    #[test]
    fn accepts_provider_published_date_alias() {
        let ev: RawEvent = serde_json::from_str(
            r#"{"title":"x","url":"u","publishedDate":"2025-01-02T00:00:00Z","event_type":"press"}"#,
        )
        .unwrap();
        assert_eq!(ev.published_at.as_deref(), Some("2025-01-02T00:00:00Z"));
        assert_eq!(ev.event_type, EventType::Press);
    }
}
