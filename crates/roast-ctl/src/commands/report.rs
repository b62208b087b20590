use anyhow::{bail, Result};
use chrono::{Local, Utc};
use roast_common::{ReportPersonality, WeeklyReport};
use roast_daemon::{DigestWriter, ReportService, ShareableRoast, StatsAssembler};
use std::sync::Arc;

use super::{parse_week, week_of, Env};

fn service(env: &Env) -> ReportService<Local> {
    let assembler = StatsAssembler::new(env.database.clone(), env.calendar.clone())
        .with_compulsive_window_days(env.config.analytics.compulsive_window_days);
    ReportService::new(assembler, env.database.clone(), Arc::new(DigestWriter))
}

fn print_report(env: &Env, report: &WeeklyReport) {
    println!(
        "{} to {} ({})",
        env.calendar.local_date(report.week_start),
        env.calendar.local_date(report.week_end),
        report.personality
    );
    println!("Generated {}", report.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!();
    println!("{}", report.analysis);
}

async fn find(env: &Env, service: &ReportService<Local>, week: &str) -> Result<WeeklyReport> {
    let week_start = parse_week(&env.calendar, week)?;
    match service.report_for_week(week_start).await? {
        Some(report) => Ok(report),
        None => bail!("No report stored for the week of {}", env.calendar.local_date(week_start)),
    }
}

pub async fn list(limit: i64) -> Result<()> {
    let env = Env::open().await?;
    let reports = service(&env).recent_reports(limit).await?;

    if reports.is_empty() {
        println!("No reports yet");
    } else {
        for report in &reports {
            let summary = report
                .week_stats()
                .map(|stats| format!("{} switches", stats.total_context_switches))
                .unwrap_or_else(|| "stats unavailable".to_string());
            println!(
                "  {}  {:<12}  {}",
                env.calendar.local_date(report.week_start),
                report.personality.as_str(),
                summary
            );
        }
    }

    env.close().await;
    Ok(())
}

pub async fn show(week: &str) -> Result<()> {
    let env = Env::open().await?;
    let report = find(&env, &service(&env), week).await?;
    print_report(&env, &report);

    env.close().await;
    Ok(())
}

pub async fn generate(weeks_ago: u32, personality: ReportPersonality) -> Result<()> {
    let env = Env::open().await?;
    let now = Utc::now();
    let report =
        service(&env).generate_weekly_report(week_of(now, weeks_ago), personality, now).await?;
    print_report(&env, &report);

    env.close().await;
    Ok(())
}

pub async fn regenerate(week: &str, personality: ReportPersonality) -> Result<()> {
    let env = Env::open().await?;
    let service = service(&env);
    let report = find(&env, &service, week).await?;

    let updated = service.regenerate_report(&report, personality).await?;
    print_report(&env, &updated);

    env.close().await;
    Ok(())
}

pub async fn share(week: &str, full: bool) -> Result<()> {
    let env = Env::open().await?;
    let report = find(&env, &service(&env), week).await?;

    let Some(roast) = ShareableRoast::from_report(&report, &Local) else {
        bail!("Only {} reports can be shared", ReportPersonality::Roast);
    };

    if full {
        println!("{}", roast.clipboard_text());
    } else {
        println!("{}", roast.tweet_text());
    }

    env.close().await;
    Ok(())
}
