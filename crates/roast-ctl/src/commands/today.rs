use anyhow::Result;
use chrono::Utc;
use roast_common::format::{format_duration, format_duration_long};
use roast_daemon::StatsAssembler;

use super::Env;

pub async fn show(json: bool) -> Result<()> {
    let env = Env::open().await?;
    let assembler = StatsAssembler::new(env.database.clone(), env.calendar.clone())
        .with_compulsive_window_days(env.config.analytics.compulsive_window_days);

    // The open session lives in the daemon and is not persisted until it closes
    let stats = assembler.today_stats(Utc::now(), None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        env.close().await;
        return Ok(());
    }

    println!("Today");
    println!("=====");
    println!();
    println!("Active time:       {}", format_duration_long(stats.total_active_time));
    println!("Context switches:  {}", stats.context_switches);
    println!("Compulsive checks: {}", stats.compulsive_checks);
    println!("Deep work:         {} min", stats.deep_work_minutes);

    if !stats.top_apps.is_empty() {
        println!();
        println!("Top apps:");
        for (i, app) in stats.top_apps.iter().enumerate() {
            println!(
                "  {}. {} {} ({} sessions, {} brief)",
                i + 1,
                app.app_name,
                format_duration(app.total_time),
                app.sessions,
                app.brief_visits
            );
        }
    }

    env.close().await;
    Ok(())
}
