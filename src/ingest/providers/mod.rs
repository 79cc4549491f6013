// src/ingest/providers/mod.rs
pub mod exa;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::ingest::types::SourceProvider;
use crate::store::Company;

/// Builds the providers that refresh one watched company before it is scored.
pub trait ProviderFactory: Send + Sync {
    /// Providers for `company`, restricted to results published after `since`.
    fn providers_for(&self, company: &Company, since: DateTime<Utc>) -> Vec<Arc<dyn SourceProvider>>;
}
