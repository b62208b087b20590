use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use roast_common::Calendar;
use roast_daemon::DaemonConfig;
use roast_db::{Database, DatabaseConfig};
use std::sync::Arc;

pub mod data;
pub mod exclude;
pub mod report;
pub mod today;
pub mod week;

/// Database and calendar as configured for the daemon.
pub struct Env {
    pub config: DaemonConfig,
    pub database: Arc<Database>,
    pub calendar: Calendar<Local>,
}

impl Env {
    pub async fn open() -> Result<Self> {
        let config = DaemonConfig::load()?;
        let calendar = Calendar::local(config.analytics.week_start()?);
        let database = Database::open(DatabaseConfig { path: config.database_path() })
            .await
            .context("Failed to open database")?;

        Ok(Self { config, database: Arc::new(database), calendar })
    }

    pub async fn close(self) {
        Database::clone(&self.database).close().await;
    }
}

/// An instant inside the week `weeks_ago` weeks before the current one.
pub fn week_of(now: DateTime<Utc>, weeks_ago: u32) -> DateTime<Utc> {
    now - Duration::weeks(i64::from(weeks_ago))
}

pub fn parse_week(calendar: &Calendar<Local>, value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))?;
    Ok(calendar.start_of_week(calendar.midnight(date)))
}
