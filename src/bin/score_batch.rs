//! Score a JSON batch file offline and print ranked results.
//!
//! Usage: score-batch <companies.json> [--config <scoring.toml|json>] [--now <rfc3339>]
//!
//! The input is a JSON array of `{company_id, company_name, employee_count?, events: [...]}`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

use competitive_radar::config;
use competitive_radar::engine::{score_batch, CompanyInput};
use competitive_radar::ingest::within_lookback;
use competitive_radar::report::CompanyScoreResult;

#[derive(Debug, Parser)]
#[command(name = "score-batch")]
#[command(about = "Score a batch of companies and print them ranked by activity")]
struct Args {
    /// JSON array of companies with their raw events.
    input: PathBuf,
    /// Scoring config (TOML or JSON); env/default discovery when absent.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reference time (RFC 3339); defaults to the system clock.
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(p) => config::load_from(p)?,
        None => config::load_default()?,
    };
    let now = args.now.unwrap_or_else(Utc::now);

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let companies: Vec<CompanyInput> =
        serde_json::from_str(&raw).context("parsing company batch")?;

    let inputs = companies
        .into_iter()
        .map(|mut c| {
            c.events = within_lookback(c.events, &cfg, now);
            c
        })
        .collect();

    let mut results = score_batch(inputs, &cfg, now);
    CompanyScoreResult::sort_by_activity(&mut results);
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
