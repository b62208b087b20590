use anyhow::Result;
use chrono::Utc;
use roast_common::format::{format_duration, format_duration_long, format_hour};
use roast_common::WeeklyStats;
use roast_daemon::StatsAssembler;

use super::{week_of, Env};

pub async fn show(weeks_ago: u32, json: bool) -> Result<()> {
    let env = Env::open().await?;
    let assembler = StatsAssembler::new(env.database.clone(), env.calendar.clone())
        .with_compulsive_window_days(env.config.analytics.compulsive_window_days);

    let now = Utc::now();
    let stats = assembler.weekly_stats(week_of(now, weeks_ago), now).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_week(&env, &stats);
    }

    env.close().await;
    Ok(())
}

fn hours(list: &[u32]) -> String {
    if list.is_empty() {
        return "-".to_string();
    }
    list.iter().map(|&h| format_hour(h)).collect::<Vec<_>>().join(", ")
}

fn print_week(env: &Env, stats: &WeeklyStats) {
    let start = env.calendar.local_date(stats.week_start);
    let end = env.calendar.local_date(stats.week_end);

    println!("Week of {} to {}", start, end);
    println!("=============================");
    println!();
    println!("Tracked:          {}", format_duration_long(stats.total_tracked_time()));
    println!("Apps:             {}", stats.unique_apps());
    println!("Context switches: {}", stats.total_context_switches);
    println!("Average session:  {}", format_duration(stats.average_session_length));
    println!(
        "Deep work:        {} sessions, {} min",
        stats.deep_work_sessions.len(),
        stats.total_deep_work_minutes()
    );
    println!("Focus hours:      {}", hours(&stats.peak_productivity_hours));
    println!("Scattered hours:  {}", hours(&stats.peak_distraction_hours));

    if !stats.app_usage.is_empty() {
        println!();
        println!("Apps:");
        for app in stats.app_usage.iter().take(10) {
            println!(
                "  {:<24} {:>8}  {} sessions, avg {}",
                app.app_name,
                app.formatted_total_time(),
                app.total_sessions,
                app.formatted_average_session()
            );
        }
    }

    if !stats.compulsive_checks.is_empty() {
        println!();
        println!("Compulsive checks:");
        for check in &stats.compulsive_checks {
            let triggers = if check.trigger_apps.is_empty() {
                String::new()
            } else {
                format!(", after {}", check.trigger_apps.join(", "))
            };
            println!(
                "  {} {}/day, {} each{}",
                check.app_name,
                check.formatted_checks_per_day(),
                check.formatted_average_duration(),
                triggers
            );
        }
    }

    if !stats.fragmented_hours.is_empty() {
        println!();
        println!("Fragmented hours:");
        for hour in &stats.fragmented_hours {
            println!(
                "  {} {}: {} switches across {}",
                env.calendar.local_date(hour.date),
                format_hour(hour.hour),
                hour.switch_count,
                hour.apps_used.join(", ")
            );
        }
    }

    println!();
    println!("Daily:");
    for day in &stats.daily_breakdowns {
        println!(
            "  {:<10} {:>8}  {:>4} switches  {:>3} min deep  {}",
            env.calendar.day_name(day.date),
            format_duration(day.total_active_time),
            day.context_switches,
            day.deep_work_minutes,
            day.top_apps.join(", ")
        );
    }

    if let Some(change) = &stats.week_over_week_changes {
        println!();
        println!("Versus last week:");
        println!("  Context switches: {}", change.context_switch_change_formatted());
        println!("  Session length:   {}", change.session_length_change_formatted());
        println!("  Tracked time:     {}", change.total_time_change_formatted());
        println!("  Deep work:        {:+} sessions", change.deep_work_sessions_change);
    }
}
