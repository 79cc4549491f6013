//! digest.rs: weekly markdown digest over the signals of a period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::signals::Signal;

pub const REPORT_HEADING: &str = "# Weekly Competitive Intelligence Report";

#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyReportRequest {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(default)]
    pub company_ids: Option<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub contents_md: String,
    #[serde(default)]
    pub url_list: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub contents_md: String,
    pub url_list: Vec<String>,
}

fn title_case(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        Some(first) => first.to_uppercase().chain(c).collect(),
        None => String::new(),
    }
}

/// Render the digest. `signals` come newest first; companies appear in the
/// order of their first signal, unknown companies are skipped. The period is
/// inclusive on both ends.
pub fn render_weekly<F>(req: &WeeklyReportRequest, signals: &[Signal], company_name: F) -> NewReport
where
    F: Fn(u64) -> Option<String>,
{
    let mut sections: Vec<(String, Vec<&Signal>)> = Vec::new();
    for s in signals {
        if s.created_at < req.period_start || s.created_at > req.period_end {
            continue;
        }
        if let Some(ids) = &req.company_ids {
            if !ids.contains(&s.company_id) {
                continue;
            }
        }
        let Some(name) = company_name(s.company_id) else {
            continue;
        };
        match sections.iter_mut().find(|(n, _)| *n == name) {
            Some((_, list)) => list.push(s),
            None => sections.push((name, vec![s])),
        }
    }

    let mut md = format!(
        "{REPORT_HEADING}\n\n**Period:** {} to {}\n\n",
        req.period_start.format("%Y-%m-%d"),
        req.period_end.format("%Y-%m-%d")
    );
    let mut seen = HashSet::new();
    let mut url_list = Vec::new();
    for (name, list) in &sections {
        let _ = writeln!(md, "## {name}\n");
        for s in list {
            let _ = writeln!(md, "- **{}**: {}", title_case(s.kind.as_str()), s.summary);
            for u in &s.urls {
                if seen.insert(u.clone()) {
                    url_list.push(u.clone());
                }
            }
        }
        md.push('\n');
    }

    NewReport {
        period_start: req.period_start,
        period_end: req.period_end,
        contents_md: md,
        url_list,
    }
}
