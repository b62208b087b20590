//! Storage seams used by the tracker and the stats pipeline.
//!
//! [`Database`] implements every trait. Tests substitute in-memory or
//! failing stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roast_common::{ExcludedApp, Session, Visit, WeeklyReport};

use crate::connection::Database;
use crate::error::Result;
use crate::queries::{ExcludedAppQueries, ReportQueries, SessionQueries, VisitQueries};

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn save_session(&self, session: &Session) -> Result<()>;
    async fn save_visit(&self, visit: &Visit) -> Result<()>;

    /// Sessions with `start` in `[start, end]`, ascending by start.
    async fn sessions_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<Session>>;

    /// Visits with `timestamp` in `[start, end]`, ascending by timestamp.
    async fn visits_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Visit>>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save_report(&self, report: &WeeklyReport) -> Result<()>;
    async fn recent_reports(&self, limit: i64) -> Result<Vec<WeeklyReport>>;
    async fn report_for_week(&self, week_start: DateTime<Utc>) -> Result<Option<WeeklyReport>>;
}

#[async_trait]
pub trait ExclusionStore: Send + Sync {
    async fn add_excluded(&self, app: &ExcludedApp) -> Result<()>;
    async fn remove_excluded(&self, app_id: &str) -> Result<bool>;
    async fn excluded_apps(&self) -> Result<Vec<ExcludedApp>>;
}

#[async_trait]
impl ActivityStore for Database {
    async fn save_session(&self, session: &Session) -> Result<()> {
        SessionQueries::save(self, session).await
    }

    async fn save_visit(&self, visit: &Visit) -> Result<()> {
        VisitQueries::save(self, visit).await
    }

    async fn sessions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        SessionQueries::in_range(self, start, end).await
    }

    async fn visits_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Visit>> {
        VisitQueries::in_range(self, start, end).await
    }
}

#[async_trait]
impl ReportStore for Database {
    async fn save_report(&self, report: &WeeklyReport) -> Result<()> {
        ReportQueries::save(self, report).await
    }

    async fn recent_reports(&self, limit: i64) -> Result<Vec<WeeklyReport>> {
        ReportQueries::recent(self, limit).await
    }

    async fn report_for_week(&self, week_start: DateTime<Utc>) -> Result<Option<WeeklyReport>> {
        ReportQueries::for_week(self, week_start).await
    }
}

#[async_trait]
impl ExclusionStore for Database {
    async fn add_excluded(&self, app: &ExcludedApp) -> Result<()> {
        ExcludedAppQueries::add(self, app).await
    }

    async fn remove_excluded(&self, app_id: &str) -> Result<bool> {
        ExcludedAppQueries::remove(self, app_id).await
    }

    async fn excluded_apps(&self) -> Result<Vec<ExcludedApp>> {
        ExcludedAppQueries::list(self).await
    }
}
