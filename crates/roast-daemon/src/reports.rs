//! Weekly report archive.
//!
//! Prose comes from an external [`ReportWriter`]. The stats a report was
//! written from are stored with it as a JSON snapshot, so a report can be
//! shown again or rewritten in another voice without recomputation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use roast_common::format::{format_date_range, format_duration, format_duration_long, format_hour};
use roast_common::{ReportPersonality, WeeklyReport, WeeklyStats};
use roast_db::ReportStore;
use std::fmt::Write;
use std::sync::Arc;
use tracing::info;

use crate::analytics::StatsAssembler;

const BURN_MARKER: &str = "\u{1F525}";
const VERDICT_HEADING: &str = "**The Verdict**";
const DEFAULT_BURN: &str = "I got absolutely destroyed by Roast \u{1F525}";

#[async_trait]
pub trait ReportWriter: Send + Sync {
    async fn write_report(&self, stats: &WeeklyStats, personality: ReportPersonality)
        -> Result<String>;
}

/// Offline writer that turns the numbers into a short plain-text digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestWriter;

impl DigestWriter {
    fn headline(personality: ReportPersonality) -> &'static str {
        match personality {
            ReportPersonality::Encouraging => "Nice work this week. Here is what went well.",
            ReportPersonality::Professional => "Weekly focus briefing.",
            ReportPersonality::Neutral => "Your week in review.",
            ReportPersonality::Roast => "Let's talk about what you did to your attention span.",
        }
    }

    pub fn render(stats: &WeeklyStats, personality: ReportPersonality) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}\n", Self::headline(personality));

        let _ = writeln!(
            out,
            "Tracked {} across {} apps.",
            format_duration_long(stats.total_tracked_time()),
            stats.unique_apps()
        );

        if let Some(top) = stats.app_usage.first() {
            let _ = writeln!(out, "Most used: {} ({}).", top.app_name, top.formatted_total_time());
        }

        let _ = writeln!(
            out,
            "{} context switches, average session {}.",
            stats.total_context_switches,
            format_duration(stats.average_session_length)
        );

        let _ = writeln!(
            out,
            "{} deep work sessions, {} minutes in total.",
            stats.deep_work_sessions.len(),
            stats.total_deep_work_minutes()
        );

        for check in &stats.compulsive_checks {
            let _ = write!(
                out,
                "Checked {} {} times a day, {} each time",
                check.app_name,
                check.formatted_checks_per_day(),
                check.formatted_average_duration()
            );
            if check.trigger_apps.is_empty() {
                let _ = writeln!(out, ".");
            } else {
                let _ = writeln!(out, ", usually right after {}.", check.trigger_apps.join(", "));
            }
        }

        if !stats.peak_productivity_hours.is_empty() {
            let hours: Vec<String> =
                stats.peak_productivity_hours.iter().map(|&h| format_hour(h)).collect();
            let _ = writeln!(out, "Best focus hours: {}.", hours.join(", "));
        }

        if !stats.peak_distraction_hours.is_empty() {
            let hours: Vec<String> =
                stats.peak_distraction_hours.iter().map(|&h| format_hour(h)).collect();
            let _ = writeln!(out, "Most scattered hours: {}.", hours.join(", "));
        }

        if let Some(change) = &stats.week_over_week_changes {
            let _ = writeln!(
                out,
                "Compared with last week: switches {}, session length {}, tracked time {}.",
                change.context_switch_change_formatted(),
                change.session_length_change_formatted(),
                change.total_time_change_formatted()
            );
        }

        if personality == ReportPersonality::Roast {
            let burn = match stats.compulsive_checks.first() {
                Some(check) => format!(
                    "You opened {} {} times a day. It was not going to change.",
                    check.app_name,
                    check.formatted_checks_per_day()
                ),
                None => format!(
                    "{} context switches and you still call it work.",
                    stats.total_context_switches
                ),
            };
            let _ = writeln!(out, "\n{}\n{}", BURN_MARKER, burn);
        }

        out
    }
}

#[async_trait]
impl ReportWriter for DigestWriter {
    async fn write_report(
        &self,
        stats: &WeeklyStats,
        personality: ReportPersonality,
    ) -> Result<String> {
        Ok(Self::render(stats, personality))
    }
}

/// Short quote pulled from a roast report for sharing.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareableRoast {
    pub full_roast: String,
    pub shareable_burn: String,
    pub week_range: String,
    pub generated_at: DateTime<Utc>,
}

impl ShareableRoast {
    /// Only roast reports are shareable. The burn is the last non-blank line
    /// without a fire marker when the text has one, else the verdict
    /// paragraph, else a stock line.
    pub fn from_report<Tz: TimeZone>(report: &WeeklyReport, tz: &Tz) -> Option<Self> {
        if !report.is_shareable() {
            return None;
        }

        let burn = burn_line(&report.analysis)
            .or_else(|| verdict(&report.analysis))
            .unwrap_or_else(|| DEFAULT_BURN.to_string());

        Some(Self {
            full_roast: report.analysis.clone(),
            shareable_burn: burn,
            week_range: format_date_range(
                report.week_start.with_timezone(tz).date_naive(),
                report.week_end.with_timezone(tz).date_naive(),
            ),
            generated_at: report.created_at,
        })
    }

    pub fn tweet_text(&self) -> String {
        format!(
            "{}\n\n\u{2014} My productivity roast for {}\n{} Roasted by Roast",
            self.shareable_burn, self.week_range, BURN_MARKER
        )
    }

    pub fn short_share_text(&self) -> String {
        format!("{} {}\n\nGet roasted: Roast", BURN_MARKER, self.shareable_burn)
    }

    pub fn clipboard_text(&self) -> String {
        format!("{}\n\n---\nRoasted by Roast \u{2022} {}", self.full_roast, self.week_range)
    }
}

fn burn_line(analysis: &str) -> Option<String> {
    if !analysis.contains(BURN_MARKER) {
        return None;
    }

    analysis
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty() && !line.contains(BURN_MARKER))
        .map(|line| line.trim().to_string())
}

fn verdict(analysis: &str) -> Option<String> {
    let start = analysis.find(VERDICT_HEADING)? + VERDICT_HEADING.len();
    let rest = &analysis[start..];
    let body = match rest.find("\n\n") {
        Some(end) => &rest[..end],
        None => return None,
    };

    let cleaned = body
        .replace("**", "")
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string();

    (!cleaned.is_empty()).then_some(cleaned)
}

pub struct ReportService<Tz: TimeZone> {
    assembler: StatsAssembler<Tz>,
    reports: Arc<dyn ReportStore>,
    writer: Arc<dyn ReportWriter>,
}

impl<Tz: TimeZone> ReportService<Tz> {
    pub fn new(
        assembler: StatsAssembler<Tz>,
        reports: Arc<dyn ReportStore>,
        writer: Arc<dyn ReportWriter>,
    ) -> Self {
        Self { assembler, reports, writer }
    }

    /// Computes the week's stats, has them written up, and stores the result.
    pub async fn generate_weekly_report(
        &self,
        week_of: DateTime<Utc>,
        personality: ReportPersonality,
        now: DateTime<Utc>,
    ) -> Result<WeeklyReport> {
        let stats = self
            .assembler
            .weekly_stats(week_of, now)
            .await
            .context("Failed to compute weekly stats")?;

        let analysis = self
            .writer
            .write_report(&stats, personality)
            .await
            .context("Failed to write report")?;

        let report = WeeklyReport::from_stats(&stats, analysis, personality)
            .context("Failed to serialize weekly stats")?;

        self.reports.save_report(&report).await.context("Failed to save report")?;

        info!("Generated {} report for week of {}", personality, report.week_start);
        Ok(report)
    }

    /// Rewrites an existing report in another voice from its stored snapshot.
    pub async fn regenerate_report(
        &self,
        report: &WeeklyReport,
        personality: ReportPersonality,
    ) -> Result<WeeklyReport> {
        let stats = report.week_stats().context("Could not parse report statistics")?;

        let analysis = self
            .writer
            .write_report(&stats, personality)
            .await
            .context("Failed to write report")?;

        let updated = WeeklyReport { analysis, personality, ..report.clone() };
        self.reports.save_report(&updated).await.context("Failed to save report")?;

        info!("Regenerated report {} as {}", updated.id, personality);
        Ok(updated)
    }

    pub async fn recent_reports(&self, limit: i64) -> Result<Vec<WeeklyReport>> {
        Ok(self.reports.recent_reports(limit).await?)
    }

    pub async fn report_for_week(&self, week_of: DateTime<Utc>) -> Result<Option<WeeklyReport>> {
        let week_start = self.assembler.calendar().start_of_week(week_of);
        Ok(self.reports.report_for_week(week_start).await?)
    }
}
