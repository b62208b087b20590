use chrono::{DateTime, TimeZone, Utc};
use roast_common::{AppUsageStat, Calendar, Session, TodayStats, WeeklyStats};
use roast_db::{ActivityStore, Result};
use std::sync::Arc;
use tracing::debug;

use super::patterns::PatternDetector;

const TODAY_TOP_APPS: usize = 5;

/// Builds the daily and weekly aggregates from store range reads.
pub struct StatsAssembler<Tz: TimeZone> {
    store: Arc<dyn ActivityStore>,
    calendar: Calendar<Tz>,
    compulsive_window_days: u32,
}

impl<Tz: TimeZone> StatsAssembler<Tz> {
    pub fn new(store: Arc<dyn ActivityStore>, calendar: Calendar<Tz>) -> Self {
        Self { store, calendar, compulsive_window_days: 7 }
    }

    pub fn with_compulsive_window_days(mut self, days: u32) -> Self {
        self.compulsive_window_days = days.max(1);
        self
    }

    pub fn calendar(&self) -> &Calendar<Tz> {
        &self.calendar
    }

    /// Today's totals. Sessions are only persisted once closed, so the open
    /// one is passed in by the caller when known.
    pub async fn today_stats(
        &self,
        now: DateTime<Utc>,
        open_session: Option<&Session>,
    ) -> Result<TodayStats> {
        let start = self.calendar.start_of_day(now);
        let end = self.calendar.end_of_day(now);

        let mut sessions = self.store.sessions_in_range(start, end).await?;
        let visits = self.store.visits_in_range(start, end).await?;

        if let Some(open) = open_session {
            let in_window = open.start >= start && open.start <= end;
            if in_window && open.is_open() && !sessions.iter().any(|s| s.id == open.id) {
                sessions.push(open.clone());
            }
        }

        let detector = PatternDetector::new(&self.calendar, now);

        let top_apps = detector
            .app_usage_stats(&sessions)
            .into_iter()
            .take(TODAY_TOP_APPS)
            .map(|app| AppUsageStat {
                app_name: app.app_name,
                app_id: app.app_id,
                total_time: app.total_time,
                sessions: app.total_sessions,
                brief_visits: app.brief_visits,
            })
            .collect();

        let (current_session_app, current_session_duration) = match sessions.last() {
            Some(last) if last.is_open() => (Some(last.app_name.clone()), Some(last.duration_at(now))),
            _ => (None, None),
        };

        Ok(TodayStats {
            total_active_time: sessions.iter().map(|s| s.duration_at(now)).sum(),
            context_switches: visits.len(),
            top_apps,
            compulsive_checks: visits.iter().filter(|v| v.is_compulsive_check()).count(),
            deep_work_minutes: detector.deep_work_minutes(&sessions),
            current_session_app,
            current_session_duration,
        })
    }

    pub async fn today_context_switches(&self, now: DateTime<Utc>) -> Result<usize> {
        let start = self.calendar.start_of_day(now);
        let end = self.calendar.end_of_day(now);
        Ok(self.store.visits_in_range(start, end).await?.len())
    }

    /// Stats for the week containing `week_of`. The window is normalized to
    /// the calendar's week boundaries and stored on the result.
    pub async fn weekly_stats(
        &self,
        week_of: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<WeeklyStats> {
        let week_start = self.calendar.start_of_week(week_of);
        let week_end = self.calendar.end_of_week(week_of);

        let sessions = self.store.sessions_in_range(week_start, week_end).await?;
        let visits = self.store.visits_in_range(week_start, week_end).await?;

        let previous_start = self.calendar.previous_week_start(week_start);
        let previous_end = self.calendar.previous_week_end(week_start);
        let previous_sessions = self.store.sessions_in_range(previous_start, previous_end).await?;
        let previous_visits = self.store.visits_in_range(previous_start, previous_end).await?;

        debug!(
            "Weekly stats for {}: {} sessions, {} visits ({} / {} the week before)",
            week_start,
            sessions.len(),
            visits.len(),
            previous_sessions.len(),
            previous_visits.len()
        );

        let detector = PatternDetector::new(&self.calendar, now);
        let average_session_length = if sessions.is_empty() {
            0.0
        } else {
            sessions.iter().map(|s| s.duration_at(now)).sum::<f64>() / sessions.len() as f64
        };
        let peaks = detector.peak_hours(&sessions, &visits);

        Ok(WeeklyStats {
            week_start,
            week_end,
            app_usage: detector.app_usage_stats(&sessions),
            total_context_switches: visits.len(),
            average_session_length,
            compulsive_checks: detector.compulsive_checks(&visits, self.compulsive_window_days),
            deep_work_sessions: detector.deep_work_sessions(&sessions),
            fragmented_hours: detector.fragmented_hours(&visits),
            daily_breakdowns: detector.daily_breakdowns(&sessions, &visits, week_start, week_end),
            peak_productivity_hours: peaks.productive,
            peak_distraction_hours: peaks.distracted,
            week_over_week_changes: detector.week_comparison(
                &sessions,
                &visits,
                &previous_sessions,
                &previous_visits,
            ),
        })
    }

    pub async fn current_week_stats(&self, now: DateTime<Utc>) -> Result<WeeklyStats> {
        self.weekly_stats(now, now).await
    }
}
