// src/ingest/providers/exa.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::{counter, histogram};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::ProviderFactory;
use crate::ingest::types::{EventType, RawEvent, SourceProvider};
use crate::ingest::{parse_hits, ProviderHit};
use crate::store::Company;

pub const DEFAULT_BASE_URL: &str = "https://api.exa.ai";
pub const ENV_EXA_API_KEY: &str = "EXA_API_KEY";
pub const DEFAULT_NUM_RESULTS: u32 = 10;

/// Search phrasing per event type.
pub fn query_for(company_name: &str, event_type: EventType) -> String {
    match event_type {
        EventType::Product => format!("{company_name} new features product updates"),
        EventType::Funding => format!("{company_name} funding round investment"),
        EventType::Press => format!("{company_name} news coverage interview"),
        EventType::Security => format!("{company_name} security advisory vulnerability"),
        EventType::Other => company_name.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(rename = "type")]
    pub search_type: String,
    pub num_results: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ProviderHit>,
}

enum Mode {
    Http {
        client: Client,
        base_url: String,
        api_key: String,
        timeout: Duration,
    },
    Fixture(String),
}

/// One search query whose hits are all tagged with the same event type.
pub struct ExaSearchProvider {
    request: SearchRequest,
    event_type: EventType,
    mode: Mode,
}

impl ExaSearchProvider {
    pub fn new(api_key: impl Into<String>, company_name: &str, event_type: EventType) -> Self {
        Self {
            request: Self::base_request(company_name, event_type),
            event_type,
            mode: Mode::Http {
                client: Client::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key: api_key.into(),
                timeout: Duration::from_secs(30),
            },
        }
    }

    /// Reads the key from `EXA_API_KEY`.
    pub fn from_env(company_name: &str, event_type: EventType) -> Result<Self> {
        let key = std::env::var(ENV_EXA_API_KEY)
            .with_context(|| format!("{ENV_EXA_API_KEY} not set"))?;
        Ok(Self::new(key, company_name, event_type))
    }

    /// Parses a stored search response instead of calling out.
    pub fn from_fixture(content: &str, company_name: &str, event_type: EventType) -> Self {
        Self {
            request: Self::base_request(company_name, event_type),
            event_type,
            mode: Mode::Fixture(content.to_string()),
        }
    }

    fn base_request(company_name: &str, event_type: EventType) -> SearchRequest {
        SearchRequest {
            query: query_for(company_name, event_type),
            search_type: "auto".to_string(),
            num_results: DEFAULT_NUM_RESULTS,
            include_domains: Vec::new(),
            start_published_date: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let Mode::Http { base_url, .. } = &mut self.mode {
            *base_url = url.into().trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        if let Mode::Http { timeout, .. } = &mut self.mode {
            *timeout = Duration::from_secs(secs);
        }
        self
    }

    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.request.include_domains = domains;
        self
    }

    pub fn with_start_date(mut self, iso: impl Into<String>) -> Self {
        self.request.start_published_date = Some(iso.into());
        self
    }

    pub fn with_num_results(mut self, n: u32) -> Self {
        self.request.num_results = n;
        self
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    async fn search_body(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture(content) => Ok(content.clone()),
            Mode::Http {
                client,
                base_url,
                api_key,
                timeout,
            } => {
                let rsp = client
                    .post(format!("{base_url}/search"))
                    .timeout(*timeout)
                    .header("accept", "application/json")
                    .header("x-api-key", api_key)
                    .json(&self.request)
                    .send()
                    .await
                    .context("exa search request")?;
                if let Err(e) = rsp.error_for_status_ref() {
                    return Err(anyhow!("exa search HTTP error: {e}"));
                }
                rsp.text().await.context("reading exa search body")
            }
        }
    }
}

#[async_trait]
impl SourceProvider for ExaSearchProvider {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>> {
        let body = self.search_body().await?;

        let t0 = std::time::Instant::now();
        let parsed: SearchResponse =
            serde_json::from_str(&body).context("parsing exa search response")?;
        let received = parsed.results.len();
        let out = parse_hits(parsed.results, self.event_type);

        histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
        counter!("ingest_events_total").increment(out.len() as u64);
        tracing::debug!(
            target: "ingest",
            provider = self.name(),
            event_type = %self.event_type,
            received,
            kept = out.len(),
            "exa hits parsed"
        );
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "exa"
    }
}

/// Where the factory's providers get their search results from.
#[derive(Debug, Clone)]
enum FactorySource {
    Http { api_key: String, base_url: String },
    Fixture(String),
}

/// One Exa search per known event type for every watched company.
#[derive(Debug, Clone)]
pub struct ExaSearchFactory {
    source: FactorySource,
}

impl ExaSearchFactory {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            source: FactorySource::Http {
                api_key: api_key.into(),
                base_url: DEFAULT_BASE_URL.to_string(),
            },
        }
    }

    /// `None` when `EXA_API_KEY` is unset or blank.
    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_EXA_API_KEY)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }

    /// Every provider answers with the same stored search response.
    pub fn from_fixture(content: impl Into<String>) -> Self {
        Self {
            source: FactorySource::Fixture(content.into()),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let FactorySource::Http { base_url, .. } = &mut self.source {
            *base_url = url.into();
        }
        self
    }
}

impl ProviderFactory for ExaSearchFactory {
    fn providers_for(&self, company: &Company, since: DateTime<Utc>) -> Vec<Arc<dyn SourceProvider>> {
        let start = since.to_rfc3339_opts(SecondsFormat::Millis, true);
        EventType::KNOWN
            .iter()
            .map(|&t| {
                let p = match &self.source {
                    FactorySource::Http { api_key, base_url } => {
                        ExaSearchProvider::new(api_key.clone(), &company.name, t)
                            .with_base_url(base_url.clone())
                    }
                    FactorySource::Fixture(content) => {
                        ExaSearchProvider::from_fixture(content, &company.name, t)
                    }
                }
                .with_include_domains(company.domains.clone())
                .with_start_date(start.clone());
                Arc::new(p) as Arc<dyn SourceProvider>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_templates_per_type() {
        assert_eq!(
            query_for("Acme", EventType::Funding),
            "Acme funding round investment"
        );
        assert_eq!(
            query_for("Acme", EventType::Security),
            "Acme security advisory vulnerability"
        );
    }

    #[test]
    fn request_serializes_in_wire_case() {
        let p = ExaSearchProvider::new("k", "Acme", EventType::Product)
            .with_include_domains(vec!["acme.com".into()])
            .with_start_date("2025-01-01T00:00:00.000Z");
        let v = serde_json::to_value(p.request()).unwrap();
        assert_eq!(v["query"], "Acme new features product updates");
        assert_eq!(v["type"], "auto");
        assert_eq!(v["numResults"], 10);
        assert_eq!(v["includeDomains"][0], "acme.com");
        assert_eq!(v["startPublishedDate"], "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn empty_optionals_are_omitted() {
        let p = ExaSearchProvider::new("k", "Acme", EventType::Press);
        let v = serde_json::to_value(p.request()).unwrap();
        assert!(v.get("includeDomains").is_none());
        assert!(v.get("startPublishedDate").is_none());
    }

    #[tokio::test]
    async fn fixture_mode_parses_results() {
        let body = r#"{"results":[
            {"title":"Acme ships v2","url":"https://acme.com/blog/v2","publishedDate":"2025-05-01T00:00:00.000Z","id":"x"},
            {"title":null,"url":"https://acme.com/none"}
        ]}"#;
        let p = ExaSearchProvider::from_fixture(body, "Acme", EventType::Product);
        let out = p.fetch_events().await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Acme ships v2");
        assert_eq!(out[0].event_type, EventType::Product);
    }

    #[test]
    fn factory_builds_one_search_per_known_type() {
        use chrono::TimeZone;
        let company = Company {
            id: 1,
            name: "Acme".into(),
            domains: vec!["acme.com".into()],
            linkedin_url: None,
            github_org: None,
            tags: vec![],
            employee_count: None,
            created_at: Utc::now(),
        };
        let since = Utc.with_ymd_and_hms(2024, 12, 6, 12, 0, 0).unwrap();
        let providers = ExaSearchFactory::new("k").providers_for(&company, since);
        assert_eq!(providers.len(), EventType::KNOWN.len());
        assert!(providers.iter().all(|p| p.name() == "exa"));
    }

    #[tokio::test]
    async fn malformed_fixture_is_an_error() {
        let p = ExaSearchProvider::from_fixture("not json", "Acme", EventType::Press);
        assert!(p.fetch_events().await.is_err());
    }
}
