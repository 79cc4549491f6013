//! store.rs: in-memory watch list: companies, their watches, the raw
//! events waiting to be scored, and the signals and digests produced from them.
//!
//! Ids are per table, monotonically increasing from 1. Everything lives
//! behind one lock so a company and its watch appear together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::digest::{NewReport, Report};
use crate::engine::CompanyInput;
use crate::ingest::types::RawEvent;
use crate::signals::{NewSignal, Signal};

pub const DEFAULT_SCHEDULE: &str = "weekly";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_org: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub employee_count: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when a company is put on the watch list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_org: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub employee_count: Option<i64>,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub schedule: Option<String>,
}

/// Partial update; absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub domains: Option<Vec<String>>,
    pub linkedin_url: Option<String>,
    pub github_org: Option<String>,
    pub tags: Option<Vec<String>>,
    pub employee_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorWatch {
    pub id: u64,
    pub company_id: u64,
    #[serde(default)]
    pub include_paths: Vec<String>,
    pub schedule: String,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    companies: BTreeMap<u64, Company>,
    watches: BTreeMap<u64, VendorWatch>,
    events: BTreeMap<u64, Vec<RawEvent>>,
    signals: BTreeMap<u64, Signal>,
    reports: BTreeMap<u64, Report>,
    last_company_id: u64,
    last_watch_id: u64,
    last_signal_id: u64,
    last_report_id: u64,
}

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a company and its watch in one step.
    pub fn create_company(&self, req: NewCompany, now: DateTime<Utc>) -> (Company, VendorWatch) {
        let mut t = self.write();
        t.last_company_id += 1;
        let company = Company {
            id: t.last_company_id,
            name: req.name,
            domains: req.domains,
            linkedin_url: req.linkedin_url,
            github_org: req.github_org,
            tags: req.tags,
            employee_count: req.employee_count,
            created_at: now,
        };
        t.companies.insert(company.id, company.clone());
        let watch = insert_watch(&mut t, company.id, req.include_paths, req.schedule);
        (company, watch)
    }

    pub fn get_company(&self, id: u64) -> Option<Company> {
        self.read().companies.get(&id).cloned()
    }

    /// All companies, by id.
    pub fn list_companies(&self) -> Vec<Company> {
        self.read().companies.values().cloned().collect()
    }

    pub fn update_company(&self, id: u64, upd: CompanyUpdate) -> Option<Company> {
        let mut t = self.write();
        let c = t.companies.get_mut(&id)?;
        if let Some(v) = upd.name {
            c.name = v;
        }
        if let Some(v) = upd.domains {
            c.domains = v;
        }
        if upd.linkedin_url.is_some() {
            c.linkedin_url = upd.linkedin_url;
        }
        if upd.github_org.is_some() {
            c.github_org = upd.github_org;
        }
        if let Some(v) = upd.tags {
            c.tags = v;
        }
        if upd.employee_count.is_some() {
            c.employee_count = upd.employee_count;
        }
        Some(c.clone())
    }

    /// Extra watch for an existing company; `None` if the company is unknown.
    pub fn create_watch(
        &self,
        company_id: u64,
        include_paths: Vec<String>,
        schedule: Option<String>,
    ) -> Option<VendorWatch> {
        let mut t = self.write();
        if !t.companies.contains_key(&company_id) {
            return None;
        }
        Some(insert_watch(&mut t, company_id, include_paths, schedule))
    }

    pub fn watches_for(&self, company_id: u64) -> Vec<VendorWatch> {
        self.read()
            .watches
            .values()
            .filter(|w| w.company_id == company_id)
            .cloned()
            .collect()
    }

    /// Queue raw events for a company. Returns the number now pending, or
    /// `None` if the company is unknown.
    pub fn append_events(&self, company_id: u64, events: Vec<RawEvent>) -> Option<usize> {
        let mut t = self.write();
        if !t.companies.contains_key(&company_id) {
            return None;
        }
        let pending = t.events.entry(company_id).or_default();
        pending.extend(events);
        Some(pending.len())
    }

    /// Replace the pending events of a company with `f(pending)`. Returns the
    /// number kept, or `None` if the company is unknown.
    pub fn compact_events<F>(&self, company_id: u64, f: F) -> Option<usize>
    where
        F: FnOnce(Vec<RawEvent>) -> Vec<RawEvent>,
    {
        let mut t = self.write();
        if !t.companies.contains_key(&company_id) {
            return None;
        }
        let pending = t.events.remove(&company_id).unwrap_or_default();
        let kept = f(pending);
        let n = kept.len();
        t.events.insert(company_id, kept);
        Some(n)
    }

    pub fn events_for(&self, company_id: u64) -> Vec<RawEvent> {
        self.read()
            .events
            .get(&company_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Stamp `last_run_at` on every watch of the company.
    pub fn mark_run(&self, company_id: u64, at: DateTime<Utc>) -> usize {
        let mut t = self.write();
        let mut n = 0;
        for w in t.watches.values_mut().filter(|w| w.company_id == company_id) {
            w.last_run_at = Some(at);
            n += 1;
        }
        n
    }

    /// The given companies (all when `ids` is `None`), unknown ids skipped.
    pub fn select_companies(&self, ids: Option<&[u64]>) -> Vec<Company> {
        let t = self.read();
        match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| t.companies.get(id).cloned())
                .collect(),
            None => t.companies.values().cloned().collect(),
        }
    }

    /// Scoring inputs for the given companies (all when `ids` is `None`).
    /// Unknown ids are skipped.
    pub fn company_inputs(&self, ids: Option<&[u64]>) -> Vec<CompanyInput> {
        let companies = self.select_companies(ids);
        let t = self.read();
        companies
            .into_iter()
            .map(|c| CompanyInput {
                events: t.events.get(&c.id).cloned().unwrap_or_default(),
                company_id: c.id,
                company_name: c.name,
                employee_count: c.employee_count,
            })
            .collect()
    }

    pub fn create_signal(&self, new: NewSignal, now: DateTime<Utc>) -> Signal {
        let mut t = self.write();
        t.last_signal_id += 1;
        let signal = Signal {
            id: t.last_signal_id,
            company_id: new.company_id,
            kind: new.kind,
            title: new.title,
            summary: new.summary,
            severity: new.severity,
            confidence: new.confidence,
            urls: new.urls,
            created_at: now,
        };
        t.signals.insert(signal.id, signal.clone());
        signal
    }

    /// Newest first; optionally only one company's.
    pub fn list_signals(&self, company_id: Option<u64>) -> Vec<Signal> {
        let t = self.read();
        let mut out: Vec<Signal> = t
            .signals
            .values()
            .filter(|s| company_id.map_or(true, |id| s.company_id == id))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }

    pub fn create_report(&self, new: NewReport, now: DateTime<Utc>) -> Report {
        let mut t = self.write();
        t.last_report_id += 1;
        let report = Report {
            id: t.last_report_id,
            period_start: new.period_start,
            period_end: new.period_end,
            contents_md: new.contents_md,
            url_list: new.url_list,
            created_at: now,
        };
        t.reports.insert(report.id, report.clone());
        report
    }

    /// Newest first.
    pub fn list_reports(&self) -> Vec<Report> {
        let mut out: Vec<Report> = self.read().reports.values().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }
}

fn insert_watch(
    t: &mut Tables,
    company_id: u64,
    include_paths: Vec<String>,
    schedule: Option<String>,
) -> VendorWatch {
    t.last_watch_id += 1;
    let watch = VendorWatch {
        id: t.last_watch_id,
        company_id,
        include_paths,
        schedule: schedule.unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),
        last_run_at: None,
    };
    t.watches.insert(watch.id, watch.clone());
    watch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::EventType;

    fn acme() -> NewCompany {
        NewCompany {
            name: "Acme".into(),
            domains: vec!["acme.com".into()],
            employee_count: Some(120),
            ..Default::default()
        }
    }

    #[test]
    fn ids_start_at_one_per_table() {
        let s = Store::new();
        let now = Utc::now();
        let (c1, w1) = s.create_company(acme(), now);
        let (c2, _) = s.create_company(acme(), now);
        assert_eq!((c1.id, c2.id), (1, 2));
        assert_eq!(w1.id, 1);
        assert_eq!(w1.schedule, DEFAULT_SCHEDULE);
        let w = s.create_watch(1, vec!["/blog".into()], Some("daily".into())).unwrap();
        assert_eq!(w.id, 3);
        assert_eq!(s.watches_for(1).len(), 2);
        assert!(s.create_watch(99, vec![], None).is_none());
    }

    #[test]
    fn update_touches_only_given_fields() {
        let s = Store::new();
        let (c, _) = s.create_company(acme(), Utc::now());
        let upd = CompanyUpdate {
            employee_count: Some(5000),
            ..Default::default()
        };
        let c2 = s.update_company(c.id, upd).unwrap();
        assert_eq!(c2.name, "Acme");
        assert_eq!(c2.employee_count, Some(5000));
        assert!(s.update_company(42, CompanyUpdate::default()).is_none());
    }

    #[test]
    fn events_and_inputs() {
        let s = Store::new();
        let (c, _) = s.create_company(acme(), Utc::now());
        let ev = RawEvent::new("t", "https://acme.com/x", None, EventType::Press);
        assert_eq!(s.append_events(c.id, vec![ev.clone(), ev.clone()]), Some(2));
        assert_eq!(s.append_events(7, vec![ev]), None);
        assert_eq!(s.events_for(c.id).len(), 2);

        let inputs = s.company_inputs(Some(&[c.id, 7]));
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].employee_count, Some(120));
        assert_eq!(inputs[0].events.len(), 2);
    }

    #[test]
    fn compaction_rewrites_pending_events() {
        let s = Store::new();
        let (c, _) = s.create_company(acme(), Utc::now());
        let keep = RawEvent::new("keep", "https://acme.com/k", None, EventType::Press);
        let noise = RawEvent::new("noise", "https://acme.com/n", None, EventType::Press);
        s.append_events(c.id, vec![keep.clone(), noise, keep.clone()]);

        let kept = s.compact_events(c.id, |evs| {
            let mut evs: Vec<RawEvent> = evs.into_iter().filter(|e| e.title == "keep").collect();
            evs.truncate(1);
            evs
        });
        assert_eq!(kept, Some(1));
        assert_eq!(s.events_for(c.id), vec![keep]);
        assert_eq!(s.compact_events(99, |evs| evs), None);
    }

    #[test]
    fn signals_and_reports_list_newest_first() {
        use crate::digest::NewReport;
        use crate::signals::{NewSignal, Severity};
        use chrono::Duration;

        let s = Store::new();
        let t0 = Utc::now();
        let new = |company_id| NewSignal {
            company_id,
            kind: EventType::Product,
            title: "t".into(),
            summary: "s".into(),
            severity: Severity::Low,
            confidence: 0.8,
            urls: vec![],
        };
        let a = s.create_signal(new(1), t0);
        let b = s.create_signal(new(2), t0 + Duration::hours(1));
        let c = s.create_signal(new(1), t0 + Duration::hours(1));
        let ids: Vec<u64> = s.list_signals(None).iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
        let only_1: Vec<u64> = s.list_signals(Some(1)).iter().map(|x| x.id).collect();
        assert_eq!(only_1, vec![c.id, a.id]);

        let report = |md: &str| NewReport {
            period_start: t0,
            period_end: t0,
            contents_md: md.into(),
            url_list: vec![],
        };
        s.create_report(report("first"), t0);
        s.create_report(report("second"), t0 + Duration::minutes(1));
        let reports = s.list_reports();
        assert_eq!(reports[0].id, 2);
        assert_eq!(reports[1].contents_md, "first");
    }

    #[test]
    fn mark_run_stamps_watches() {
        let s = Store::new();
        let (c, _) = s.create_company(acme(), Utc::now());
        let at = Utc::now();
        assert_eq!(s.mark_run(c.id, at), 1);
        assert_eq!(s.watches_for(c.id)[0].last_run_at, Some(at));
    }
}
