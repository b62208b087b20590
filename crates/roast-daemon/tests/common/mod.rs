#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use roast_common::{ExcludedApp, FocusedApp, Session, Visit};
use roast_db::{ActivityStore, ExclusionStore, Result};
use std::sync::Mutex;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap() + Duration::seconds(secs)
}

pub fn app(id: &str) -> FocusedApp {
    FocusedApp::new(id, id.to_uppercase())
}

/// Activity and exclusion store kept in memory.
#[derive(Default)]
pub struct FakeStore {
    sessions: Mutex<Vec<Session>>,
    visits: Mutex<Vec<Visit>>,
    excluded: Mutex<Vec<ExcludedApp>>,
}

impl FakeStore {
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.visits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityStore for FakeStore {
    async fn save_session(&self, session: &Session) -> Result<()> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn save_visit(&self, visit: &Visit) -> Result<()> {
        self.visits.lock().unwrap().push(visit.clone());
        Ok(())
    }

    async fn sessions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        Ok(self.sessions().into_iter().filter(|s| s.start >= start && s.start <= end).collect())
    }

    async fn visits_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Visit>> {
        Ok(self
            .visits()
            .into_iter()
            .filter(|v| v.timestamp >= start && v.timestamp <= end)
            .collect())
    }
}

#[async_trait]
impl ExclusionStore for FakeStore {
    async fn add_excluded(&self, app: &ExcludedApp) -> Result<()> {
        self.excluded.lock().unwrap().push(app.clone());
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
