//! Row types as stored in SQLite, and their conversions to the shared domain
//! types. Instants are stored as epoch milliseconds so range predicates
//! compare numerically.

use chrono::{DateTime, Utc};
use roast_common::{ExcludedApp, ReportPersonality, Session, Visit, WeeklyReport};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{DbError, Result};

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn from_millis(ms: i64, column: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DbError::InvalidData(format!("{} out of range: {}", column, ms)))
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbSession {
    pub id: String,
    pub app_id: String,
    pub app_name: String,
    pub window_title: Option<String>,
    pub start_ms: i64,
    pub end_ms: Option<i64>,
    pub is_active: bool,
    pub created_at_ms: i64,
}

impl From<&Session> for DbSession {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            app_id: session.app_id.clone(),
            app_name: session.app_name.clone(),
            window_title: session.window_title.clone(),
            start_ms: to_millis(session.start),
            end_ms: session.end.map(to_millis),
            is_active: session.is_active,
            created_at_ms: to_millis(session.created_at),
        }
    }
}

impl TryFrom<DbSession> for Session {
    type Error = DbError;

    fn try_from(row: DbSession) -> Result<Self> {
        Ok(Session {
            id: Uuid::parse_str(&row.id)?,
            app_id: row.app_id,
            app_name: row.app_name,
            window_title: row.window_title,
            start: from_millis(row.start_ms, "start_ms")?,
            end: row.end_ms.map(|ms| from_millis(ms, "end_ms")).transpose()?,
            is_active: row.is_active,
            created_at: from_millis(row.created_at_ms, "created_at_ms")?,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbVisit {
    pub id: String,
    pub app_id: String,
    pub app_name: String,
    pub timestamp_ms: i64,
    pub duration_seconds: f64,
    pub previous_app_id: Option<String>,
    pub created_at_ms: i64,
}

impl From<&Visit> for DbVisit {
    fn from(visit: &Visit) -> Self {
        Self {
            id: visit.id.to_string(),
            app_id: visit.app_id.clone(),
            app_name: visit.app_name.clone(),
            timestamp_ms: to_millis(visit.timestamp),
            duration_seconds: visit.duration_secs,
            previous_app_id: visit.previous_app_id.clone(),
            created_at_ms: to_millis(visit.created_at),
        }
    }
}

impl TryFrom<DbVisit> for Visit {
    type Error = DbError;

    fn try_from(row: DbVisit) -> Result<Self> {
        Ok(Visit {
            id: Uuid::parse_str(&row.id)?,
            app_id: row.app_id,
            app_name: row.app_name,
            timestamp: from_millis(row.timestamp_ms, "timestamp_ms")?,
            duration_secs: row.duration_seconds,
            previous_app_id: row.previous_app_id,
            created_at: from_millis(row.created_at_ms, "created_at_ms")?,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWeeklyReport {
    pub id: String,
    pub week_start_ms: i64,
    pub week_end_ms: i64,
    pub raw_stats_json: String,
    pub analysis: String,
    pub personality: Option<String>,
    pub created_at_ms: i64,
}

impl From<&WeeklyReport> for DbWeeklyReport {
    fn from(report: &WeeklyReport) -> Self {
        Self {
            id: report.id.to_string(),
            week_start_ms: to_millis(report.week_start),
            week_end_ms: to_millis(report.week_end),
            raw_stats_json: report.raw_stats_json.clone(),
            analysis: report.analysis.clone(),
            personality: Some(report.personality.as_str().to_string()),
            created_at_ms: to_millis(report.created_at),
        }
    }
}

impl TryFrom<DbWeeklyReport> for WeeklyReport {
    type Error = DbError;

    fn try_from(row: DbWeeklyReport) -> Result<Self> {
        Ok(WeeklyReport {
            id: Uuid::parse_str(&row.id)?,
            week_start: from_millis(row.week_start_ms, "week_start_ms")?,
            week_end: from_millis(row.week_end_ms, "week_end_ms")?,
            raw_stats_json: row.raw_stats_json,
            analysis: row.analysis,
            personality: ReportPersonality::from_stored(row.personality.as_deref()),
            created_at: from_millis(row.created_at_ms, "created_at_ms")?,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbExcludedApp {
    pub app_id: String,
    pub app_name: String,
    pub excluded_at_ms: i64,
}

impl TryFrom<DbExcludedApp> for ExcludedApp {
    type Error = DbError;

    fn try_from(row: DbExcludedApp) -> Result<Self> {
        Ok(ExcludedApp {
            app_id: row.app_id,
            app_name: row.app_name,
            excluded_at: from_millis(row.excluded_at_ms, "excluded_at_ms")?,
        })
    }
}
