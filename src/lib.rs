// src/lib.rs
// Public library surface for the binaries and integration tests.

// Scoring core (pure, no I/O)
pub mod aggregate;
pub mod analyze;
pub mod dedup;
pub mod engine;
pub mod quadrant;
pub mod rank;
pub mod report;
pub mod source_weights;

pub mod config;

// Acquisition boundary & service plumbing
pub mod api;
pub mod cache;
pub mod digest;
pub mod ingest;
pub mod metrics;
pub mod signals;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::ScoringConfiguration;
pub use crate::engine::{score_batch, CompanyInput};
pub use crate::ingest::types::{EventType, RawEvent};
pub use crate::quadrant::Quadrant;
pub use crate::report::CompanyScoreResult;
