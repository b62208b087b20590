//! Behavioral pattern detection over a window of sessions and visits.
//!
//! Everything here is a pure function of its inputs plus the calendar and
//! the instant used to measure still-open sessions. Grouping keeps groups in
//! first-seen order and every sort is stable, so equal keys come out in the
//! order they were first encountered.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use roast_common::{
    AppUsageStats, Calendar, CompulsiveCheckPattern, DailyBreakdown, DeepWorkSession,
    FragmentedHour, Session, Visit, WeekComparison, BRIEF_CHECK_SECS, COMPULSIVE_CHECKS_PER_DAY,
    DEEP_WORK_SECS, EXTENDED_SESSION_SECS, FRAGMENTED_HOUR_MIN_VISITS,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

const TOP_TRIGGER_APPS: usize = 3;
const TOP_DAILY_APPS: usize = 3;
const TOP_PEAK_HOURS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakHours {
    pub productive: Vec<u32>,
    pub distracted: Vec<u32>,
}

fn group_by<T, K, F>(items: &[T], key: F) -> Vec<(K, Vec<&T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&T>)> = Vec::new();

    for item in items {
        let k = key(item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }

    groups
}

fn sort_desc_by<T, F: Fn(&T) -> f64>(items: &mut [T], value: F) {
    items.sort_by(|a, b| value(b).partial_cmp(&value(a)).unwrap_or(Ordering::Equal));
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Top `n` hour-of-day buckets with a non-zero total. Equal totals keep
/// ascending hour order.
fn top_hours(totals: &[f64; 24], n: usize) -> Vec<u32> {
    let mut hours: Vec<u32> = (0..24u32).filter(|&h| totals[h as usize] > 0.0).collect();
    sort_desc_by(&mut hours, |&h| totals[h as usize]);
    hours.truncate(n);
    hours
}

pub struct PatternDetector<'a, Tz: TimeZone> {
    calendar: &'a Calendar<Tz>,
    now: DateTime<Utc>,
}

impl<'a, Tz: TimeZone> PatternDetector<'a, Tz> {
    /// `now` is only used to measure sessions that are still open.
    pub fn new(calendar: &'a Calendar<Tz>, now: DateTime<Utc>) -> Self {
        Self { calendar, now }
    }

    fn duration(&self, session: &Session) -> f64 {
        session.duration_at(self.now)
    }

    fn total_duration<'s>(&self, sessions: impl IntoIterator<Item = &'s Session>) -> f64 {
        sessions.into_iter().map(|s| self.duration(s)).sum()
    }

    pub fn app_usage_stats(&self, sessions: &[Session]) -> Vec<AppUsageStats> {
        let total_tracked_hours = (self.total_duration(sessions) / 3600.0).max(1.0);

        let mut stats: Vec<AppUsageStats> = group_by(sessions, |s| s.app_id.clone())
            .into_iter()
            .map(|(app_id, app_sessions)| {
                let durations: Vec<f64> = app_sessions.iter().map(|s| self.duration(s)).collect();
                let total_time: f64 = durations.iter().sum();
                let count = app_sessions.len();

                AppUsageStats {
                    app_name: app_sessions[0].app_name.clone(),
                    app_id,
                    total_time,
                    total_sessions: count,
                    average_session_length: total_time / count as f64,
                    brief_visits: durations.iter().filter(|&&d| d < BRIEF_CHECK_SECS).count(),
                    extended_sessions: durations
                        .iter()
                        .filter(|&&d| d > EXTENDED_SESSION_SECS)
                        .count(),
                    visit_frequency: count as f64 / total_tracked_hours,
                }
            })
            .collect();

        sort_desc_by(&mut stats, |s| s.total_time);
        stats
    }

    pub fn compulsive_checks(&self, visits: &[Visit], day_count: u32) -> Vec<CompulsiveCheckPattern> {
        let days = f64::from(day_count.max(1));

        let mut patterns: Vec<CompulsiveCheckPattern> = group_by(visits, |v| v.app_id.clone())
            .into_iter()
            .filter_map(|(app_id, app_visits)| {
                let brief: Vec<&Visit> =
                    app_visits.iter().copied().filter(|v| v.is_brief_check()).collect();
                let checks_per_day = brief.len() as f64 / days;

                if checks_per_day <= COMPULSIVE_CHECKS_PER_DAY {
                    return None;
                }

                let average_duration =
                    brief.iter().map(|v| v.duration_secs).sum::<f64>() / brief.len() as f64;

                Some(CompulsiveCheckPattern {
                    app_name: app_visits[0].app_name.clone(),
                    trigger_apps: trigger_apps(&app_id, &app_visits, visits),
                    app_id,
                    checks_per_day,
                    average_duration,
                })
            })
            .collect();

        sort_desc_by(&mut patterns, |p| p.checks_per_day);
        patterns
    }

    /// Sessions of at least thirty minutes, longest first.
    pub fn deep_work_sessions(&self, sessions: &[Session]) -> Vec<DeepWorkSession> {
        let mut deep: Vec<DeepWorkSession> = sessions
            .iter()
            .filter(|s| self.duration(s) >= DEEP_WORK_SECS)
            .map(|s| DeepWorkSession {
                id: s.id,
                date: self.calendar.start_of_day(s.start),
                start_time: s.start,
                duration: self.duration(s),
                primary_app: s.app_name.clone(),
                interruptions: 0,
            })
            .collect();

        sort_desc_by(&mut deep, |d| d.duration);
        deep
    }

    pub fn fragmented_hours(&self, visits: &[Visit]) -> Vec<FragmentedHour> {
        let buckets = group_by(visits, |v| -> (NaiveDate, u32) {
            (self.calendar.local_date(v.timestamp), self.calendar.hour_of_day(v.timestamp))
        });

        let mut hours: Vec<FragmentedHour> = buckets
            .into_iter()
            .filter(|(_, bucket)| bucket.len() >= FRAGMENTED_HOUR_MIN_VISITS)
            .map(|((date, hour), bucket)| {
                let mut apps_used: Vec<String> = Vec::new();
                for visit in &bucket {
                    if !apps_used.contains(&visit.app_name) {
                        apps_used.push(visit.app_name.clone());
                    }
                }

                FragmentedHour {
                    date: self.calendar.midnight(date),
                    hour,
                    switch_count: bucket.len(),
                    apps_used,
                }
            })
            .collect();

        hours.sort_by(|a, b| b.switch_count.cmp(&a.switch_count));
        hours
    }

    /// One breakdown per calendar day in `[start, end]`.
    pub fn daily_breakdowns(
        &self,
        sessions: &[Session],
        visits: &[Visit],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<DailyBreakdown> {
        self.calendar
            .days_in_range(start, end)
            .into_iter()
            .map(|day| {
                let day_end = self.calendar.end_of_day(day);
                let day_sessions: Vec<Session> = sessions
                    .iter()
                    .filter(|s| s.start >= day && s.start <= day_end)
                    .cloned()
                    .collect();
                let day_visits: Vec<Visit> = visits
                    .iter()
                    .filter(|v| v.timestamp >= day && v.timestamp <= day_end)
                    .cloned()
                    .collect();

                let mut app_times: Vec<(String, f64)> =
                    group_by(&day_sessions[..], |s| s.app_id.clone())
                        .into_iter()
                        .map(|(_, group)| {
                            (group[0].app_name.clone(), self.total_duration(group.iter().copied()))
                        })
                        .collect();
                sort_desc_by(&mut app_times, |(_, time)| *time);

                DailyBreakdown {
                    date: day,
                    total_active_time: self.total_duration(&day_sessions),
                    context_switches: day_visits.len(),
                    top_apps: app_times
                        .into_iter()
                        .take(TOP_DAILY_APPS)
                        .map(|(name, _)| name)
                        .collect(),
                    deep_work_minutes: self.deep_work_minutes(&day_sessions),
                    fragmented_hours: self.fragmented_hours(&day_visits).len(),
                }
            })
            .collect()
    }

    /// Whole minutes spent in sessions longer than thirty minutes.
    pub fn deep_work_minutes(&self, sessions: &[Session]) -> u64 {
        let seconds =
            self.total_duration(sessions.iter().filter(|s| self.duration(s) > DEEP_WORK_SECS));
        (seconds / 60.0).floor() as u64
    }

    pub fn peak_hours(&self, sessions: &[Session], visits: &[Visit]) -> PeakHours {
        let mut deep_work = [0.0f64; 24];
        let mut switches = [0.0f64; 24];

        for session in sessions {
            let duration = self.duration(session);
            if duration > DEEP_WORK_SECS {
                deep_work[self.calendar.hour_of_day(session.start) as usize] += duration;
            }
        }

        for visit in visits {
            switches[self.calendar.hour_of_day(visit.timestamp) as usize] += 1.0;
        }

        PeakHours {
            productive: top_hours(&deep_work, TOP_PEAK_HOURS),
            distracted: top_hours(&switches, TOP_PEAK_HOURS),
        }
    }

    /// `None` when the previous week has no sessions at all.
    pub fn week_comparison(
        &self,
        current_sessions: &[Session],
        current_visits: &[Visit],
        previous_sessions: &[Session],
        previous_visits: &[Visit],
    ) -> Option<WeekComparison> {
        if previous_sessions.is_empty() {
            return None;
        }

        let deep_count = |sessions: &[Session]| {
            sessions.iter().filter(|s| self.duration(s) > DEEP_WORK_SECS).count() as i64
        };
        let average = |sessions: &[Session]| {
            if sessions.is_empty() {
                0.0
            } else {
                self.total_duration(sessions) / sessions.len() as f64
            }
        };

        Some(WeekComparison {
            context_switch_change: percent_change(
                current_visits.len() as f64,
                previous_visits.len() as f64,
            ),
            deep_work_sessions_change: deep_count(current_sessions) - deep_count(previous_sessions),
            average_session_length_change: percent_change(
                average(current_sessions),
                average(previous_sessions),
            ),
            total_time_change: percent_change(
                self.total_duration(current_sessions),
                self.total_duration(previous_sessions),
            ),
        })
    }
}

/// The apps most often focused right before `app_id`, by display name.
fn trigger_apps(app_id: &str, app_visits: &[&Visit], all_visits: &[Visit]) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for visit in app_visits {
        let Some(previous) = visit.previous_app_id.as_deref() else { continue };
        if previous == app_id {
            continue;
        }
        match counts.iter_mut().find(|(id, _)| *id == previous) {
            Some((_, count)) => *count += 1,
            None => counts.push((previous, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(TOP_TRIGGER_APPS)
        .filter_map(|(id, _)| {
            all_visits.iter().find(|v| v.app_id == id).map(|v| v.app_name.clone())
        })
        .collect()
}
