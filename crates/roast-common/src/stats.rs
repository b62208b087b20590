//! Read-only aggregates computed from sessions and visits.
//!
//! These are value snapshots: nothing here is persisted directly, except as the
//! JSON snapshot embedded in a `WeeklyReport`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::{format_duration, format_percentage_change};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppUsageStats {
    pub app_name: String,
    pub app_id: String,
    pub total_time: f64,
    pub total_sessions: usize,
    pub average_session_length: f64,
    /// Sessions under 30 seconds
    pub brief_visits: usize,
    /// Sessions over 10 minutes
    pub extended_sessions: usize,
    /// Sessions per tracked hour across the whole window
    pub visit_frequency: f64,
}

impl AppUsageStats {
    pub fn formatted_total_time(&self) -> String {
        format_duration(self.total_time)
    }

    pub fn formatted_average_session(&self) -> String {
        format_duration(self.average_session_length)
    }
}

/// Compact per-app line used by the daily view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppUsageStat {
    pub app_name: String,
    pub app_id: String,
    pub total_time: f64,
    pub sessions: usize,
    pub brief_visits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompulsiveCheckPattern {
    pub app_name: String,
    pub app_id: String,
    pub checks_per_day: f64,
    pub average_duration: f64,
    /// Apps most often focused right before this one
    pub trigger_apps: Vec<String>,
}

impl CompulsiveCheckPattern {
    pub fn formatted_checks_per_day(&self) -> String {
        format!("{:.1}", self.checks_per_day)
    }

    pub fn formatted_average_duration(&self) -> String {
        format_duration(self.average_duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepWorkSession {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub duration: f64,
    pub primary_app: String,
    /// Reserved. Interruptions are not detected yet and this is always 0.
    pub interruptions: u32,
}

impl DeepWorkSession {
    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentedHour {
    pub date: DateTime<Utc>,
    pub hour: u32,
    pub switch_count: usize,
    pub apps_used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBreakdown {
    pub date: DateTime<Utc>,
    pub total_active_time: f64,
    pub context_switches: usize,
    pub top_apps: Vec<String>,
    pub deep_work_minutes: u64,
    pub fragmented_hours: usize,
}

/// Deltas between a week and the week before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekComparison {
    /// Percentage change
    pub context_switch_change: f64,
    /// Absolute change
    pub deep_work_sessions_change: i64,
    /// Percentage change
    pub average_session_length_change: f64,
    /// Percentage change
    pub total_time_change: f64,
}

impl WeekComparison {
    pub fn context_switch_change_formatted(&self) -> String {
        format_percentage_change(self.context_switch_change)
    }

    pub fn session_length_change_formatted(&self) -> String {
        format_percentage_change(self.average_session_length_change)
    }

    pub fn total_time_change_formatted(&self) -> String {
        format_percentage_change(self.total_time_change)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,

    pub app_usage: Vec<AppUsageStats>,

    pub total_context_switches: usize,
    pub average_session_length: f64,
    pub compulsive_checks: Vec<CompulsiveCheckPattern>,
    pub deep_work_sessions: Vec<DeepWorkSession>,
    pub fragmented_hours: Vec<FragmentedHour>,

    pub daily_breakdowns: Vec<DailyBreakdown>,
    pub peak_productivity_hours: Vec<u32>,
    pub peak_distraction_hours: Vec<u32>,

    /// `None` when the previous week has no sessions
    pub week_over_week_changes: Option<WeekComparison>,
}

impl WeeklyStats {
    pub fn total_tracked_time(&self) -> f64 {
        self.app_usage.iter().map(|app| app.total_time).sum()
    }

    pub fn unique_apps(&self) -> usize {
        self.app_usage.len()
    }

    pub fn total_deep_work_minutes(&self) -> u64 {
        let seconds: f64 = self.deep_work_sessions.iter().map(|s| s.duration).sum();
        (seconds / 60.0) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayStats {
    pub total_active_time: f64,
    pub context_switches: usize,
    pub top_apps: Vec<AppUsageStat>,
    pub compulsive_checks: usize,
    pub deep_work_minutes: u64,
    pub current_session_app: Option<String>,
    pub current_session_duration: Option<f64>,
}
