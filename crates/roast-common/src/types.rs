use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stats::WeeklyStats;

/// Visits shorter than this many seconds are brief checks.
pub const BRIEF_CHECK_SECS: f64 = 30.0;
/// Visits shorter than this many seconds are compulsive checks.
pub const COMPULSIVE_CHECK_SECS: f64 = 10.0;
/// Sessions longer than this many seconds count as extended sessions.
pub const EXTENDED_SESSION_SECS: f64 = 600.0;
/// Sessions of at least this many seconds are deep work.
pub const DEEP_WORK_SECS: f64 = 1800.0;
/// A (day, hour) bucket with at least this many visits is fragmented.
pub const FRAGMENTED_HOUR_MIN_VISITS: usize = 10;
/// Brief checks per day above which an app is flagged as compulsive.
pub const COMPULSIVE_CHECKS_PER_DAY: f64 = 5.0;

pub(crate) fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
}

/// The application that currently holds, or just gained, foreground focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusedApp {
    /// Stable bundle/process key
    pub app_id: String,
    /// Human readable name shown in reports
    pub app_name: String,
    pub window_title: Option<String>,
}

impl FocusedApp {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self { app_id: app_id.into(), app_name: app_name.into(), window_title: None }
    }

    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }
}

/// One contiguous interval during which a single application held focus.
///
/// A session is open while `end` is `None`. It is closed exactly once and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub app_id: String,
    pub app_name: String,
    pub window_title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn begin(app: FocusedApp, start: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            app_id: app.app_id,
            app_name: app.app_name,
            window_title: app.window_title,
            start,
            end: None,
            is_active: true,
            created_at: start,
        }
    }

    /// Closes the session. An `end` earlier than `start` is clamped so the
    /// duration never goes negative.
    pub fn close(&mut self, end: DateTime<Utc>) {
        self.end = Some(end.max(self.start));
        self.is_active = false;
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Duration in seconds, measured up to `now` while the session is open.
    pub fn duration_at(&self, now: DateTime<Utc>) -> f64 {
        seconds_between(self.start, self.end.unwrap_or(now))
    }

    pub fn duration(&self) -> f64 {
        self.duration_at(Utc::now())
    }
}

/// A point-in-time record derived from one closed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub app_id: String,
    pub app_name: String,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    /// App focused immediately before this one, `None` for the first visit
    pub previous_app_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Visit {
    pub fn from_session(session: &Session, previous_app_id: Option<String>) -> Self {
        let closed_at = session.end.unwrap_or(session.start);
        Self {
            id: Uuid::new_v4(),
            app_id: session.app_id.clone(),
            app_name: session.app_name.clone(),
            timestamp: session.start,
            duration_secs: session.duration_at(closed_at),
            previous_app_id,
            created_at: closed_at,
        }
    }

    pub fn is_brief_check(&self) -> bool {
        self.duration_secs < BRIEF_CHECK_SECS
    }

    pub fn is_compulsive_check(&self) -> bool {
        self.duration_secs < COMPULSIVE_CHECK_SECS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedApp {
    pub app_id: String,
    pub app_name: String,
    pub excluded_at: DateTime<Utc>,
}

impl ExcludedApp {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self { app_id: app_id.into(), app_name: app_name.into(), excluded_at: Utc::now() }
    }
}

/// Voice used by the report writer when turning stats into prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReportPersonality {
    Encouraging,
    Professional,
    #[default]
    Neutral,
    Roast,
}

impl ReportPersonality {
    pub const ALL: [ReportPersonality; 4] = [
        ReportPersonality::Encouraging,
        ReportPersonality::Professional,
        ReportPersonality::Neutral,
        ReportPersonality::Roast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPersonality::Encouraging => "Encouraging",
            ReportPersonality::Professional => "Professional",
            ReportPersonality::Neutral => "Neutral",
            ReportPersonality::Roast => "Roast",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportPersonality::Encouraging => "Supportive coach who celebrates your wins",
            ReportPersonality::Professional => "Executive briefing style, data-focused",
            ReportPersonality::Neutral => "Balanced and honest observations",
            ReportPersonality::Roast => "Savage comedy roast of your habits",
        }
    }

    pub fn is_shareable(&self) -> bool {
        matches!(self, ReportPersonality::Roast)
    }

    /// Lenient decoding for stored rows: unknown or missing values fall back to `Neutral`.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for ReportPersonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPersonality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportPersonality::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown report personality '{}'", s))
    }
}

/// A generated weekly report. The stats it was written from are kept as a
/// JSON snapshot so the report can be shown again without recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub id: Uuid,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub raw_stats_json: String,
    pub analysis: String,
    pub personality: ReportPersonality,
    pub created_at: DateTime<Utc>,
}

impl WeeklyReport {
    pub fn from_stats(
        stats: &WeeklyStats,
        analysis: String,
        personality: ReportPersonality,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            week_start: stats.week_start,
            week_end: stats.week_end,
            raw_stats_json: serde_json::to_string(stats)?,
            analysis,
            personality,
            created_at: Utc::now(),
        })
    }

    pub fn week_stats(&self) -> Option<WeeklyStats> {
        serde_json::from_str(&self.raw_stats_json).ok()
    }

    pub fn is_roast(&self) -> bool {
        self.personality == ReportPersonality::Roast
    }

    pub fn is_shareable(&self) -> bool {
        self.personality.is_shareable()
    }
}
