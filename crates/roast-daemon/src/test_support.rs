use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use roast_common::{ExcludedApp, FocusedApp, Session, Visit, WeeklyReport};
use roast_db::{ActivityStore, DbError, ExclusionStore, ReportStore, Result};
use std::collections::HashSet;
use std::sync::Mutex;

pub fn closed_session(app_id: &str, start: DateTime<Utc>, secs: i64) -> Session {
    let mut session = Session::begin(FocusedApp::new(app_id, app_id.to_uppercase()), start);
    session.close(start + Duration::seconds(secs));
    session
}

fn unavailable() -> DbError {
    DbError::Io(std::io::Error::new(std::io::ErrorKind::Other, "store unavailable"))
}

fn rejected(app_id: &str) -> DbError {
    DbError::InvalidData(format!("visit for {} rejected", app_id))
}

/// In-memory store whose writes can be made to fail. Rejected visits fail
/// permanently; an offline store fails every write with a transient error.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<Session>>,
    visits: Mutex<Vec<Visit>>,
    reports: Mutex<Vec<WeeklyReport>>,
    excluded: Mutex<Vec<ExcludedApp>>,
    rejected_visit_apps: Mutex<HashSet<String>>,
    fail_sessions: Mutex<bool>,
    offline: Mutex<bool>,
    visit_writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_visits_for(&self, app_id: &str) {
        self.rejected_visit_apps.lock().unwrap().insert(app_id.to_string());
    }

    pub fn go_offline(&self) {
        *self.offline.lock().unwrap() = true;
    }

    pub fn fail_sessions(&self) {
        *self.fail_sessions.lock().unwrap() = true;
    }

    pub fn clear_failures(&self) {
        self.rejected_visit_apps.lock().unwrap().clear();
        *self.fail_sessions.lock().unwrap() = false;
        *self.offline.lock().unwrap() = false;
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.visits.lock().unwrap().clone()
    }

    pub fn visit_writes(&self) -> usize {
        *self.visit_writes.lock().unwrap()
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn save_session(&self, session: &Session) -> Result<()> {
        if *self.fail_sessions.lock().unwrap() || *self.offline.lock().unwrap() {
            return Err(unavailable());
        }
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn save_visit(&self, visit: &Visit) -> Result<()> {
        *self.visit_writes.lock().unwrap() += 1;
        if *self.offline.lock().unwrap() {
            return Err(unavailable());
        }
        if self.rejected_visit_apps.lock().unwrap().contains(&visit.app_id) {
            return Err(rejected(&visit.app_id));
        }
        self.visits.lock().unwrap().push(visit.clone());
        Ok(())
    }

    async fn sessions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let mut found: Vec<_> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.start >= start && s.start <= end)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.start);
        Ok(found)
    }

    async fn visits_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Visit>> {
        let mut found: Vec<_> = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.timestamp >= start && v.timestamp <= end)
            .cloned()
            .collect();
        found.sort_by_key(|v| v.timestamp);
        Ok(found)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save_report(&self, report: &WeeklyReport) -> Result<()> {
        let mut reports = self.reports.lock().unwrap();
        reports.retain(|r| r.id != report.id);
        reports.push(report.clone());
        Ok(())
    }

    async fn recent_reports(&self, limit: i64) -> Result<Vec<WeeklyReport>> {
        let mut reports = self.reports.lock().unwrap().clone();
        reports.sort_by(|a, b| b.week_start.cmp(&a.week_start));
        reports.truncate(limit.max(0) as usize);
        Ok(reports)
    }

    async fn report_for_week(&self, week_start: DateTime<Utc>) -> Result<Option<WeeklyReport>> {
        Ok(self.reports.lock().unwrap().iter().find(|r| r.week_start == week_start).cloned())
    }
}

#[async_trait]
impl ExclusionStore for MemoryStore {
    async fn add_excluded(&self, app: &ExcludedApp) -> Result<()> {
        let mut excluded = self.excluded.lock().unwrap();
        if !excluded.iter().any(|a| a.app_id == app.app_id) {
            excluded.push(app.clone());
        }
        Ok(())
    }

    async fn remove_excluded(&self, app_id: &str) -> Result<bool> {
        let mut excluded = self.excluded.lock().unwrap();
        let before = excluded.len();
        excluded.retain(|a| a.app_id != app_id);
        Ok(excluded.len() != before)
    }

    async fn excluded_apps(&self) -> Result<Vec<ExcludedApp>> {
        Ok(self.excluded.lock().unwrap().clone())
    }
}
