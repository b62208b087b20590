use crate::connection::Database;
use crate::error::Result;
use crate::models::{to_millis, DbWeeklyReport};
use chrono::{DateTime, Utc};
use roast_common::WeeklyReport;

pub struct ReportQueries;

impl ReportQueries {
    /// Inserts a report, or rewrites the analysis and personality of an
    /// existing one with the same id.
    pub async fn save(db: &Database, report: &WeeklyReport) -> Result<()> {
        let pool = db.pool()?;
        let row = DbWeeklyReport::from(report);

        sqlx::query(
            r#"
            INSERT INTO weekly_reports (id, week_start_ms, week_end_ms, raw_stats_json, analysis, personality, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                analysis = excluded.analysis,
                personality = excluded.personality,
                created_at_ms = excluded.created_at_ms
            "#,
        )
        .bind(&row.id)
        .bind(row.week_start_ms)
        .bind(row.week_end_ms)
        .bind(&row.raw_stats_json)
        .bind(&row.analysis)
        .bind(&row.personality)
        .bind(row.created_at_ms)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Newest week first.
    pub async fn recent(db: &Database, limit: i64) -> Result<Vec<WeeklyReport>> {
        let pool = db.pool()?;

        let rows = sqlx::query_as::<_, DbWeeklyReport>(
            "SELECT * FROM weekly_reports ORDER BY week_start_ms DESC, created_at_ms DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(WeeklyReport::try_from).collect()
    }

    /// The most recently written report for the week starting at `week_start`.
    pub async fn for_week(
        db: &Database,
        week_start: DateTime<Utc>,
    ) -> Result<Option<WeeklyReport>> {
        let pool = db.pool()?;

        let row = sqlx::query_as::<_, DbWeeklyReport>(
            "SELECT * FROM weekly_reports WHERE week_start_ms = ? ORDER BY created_at_ms DESC LIMIT 1",
        )
        .bind(to_millis(week_start))
        .fetch_optional(pool)
        .await?;

        row.map(WeeklyReport::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;
    use chrono::{Duration, TimeZone};
    use roast_common::ReportPersonality;
    use uuid::Uuid;

    fn report(week_start: DateTime<Utc>, personality: ReportPersonality) -> WeeklyReport {
        WeeklyReport {
            id: Uuid::new_v4(),
            week_start,
            week_end: week_start + Duration::days(7) - Duration::milliseconds(1),
            raw_stats_json: "{}".to_string(),
            analysis: format!("{} analysis", personality),
            personality,
            created_at: week_start + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_recent_reports_newest_week_first() {
        let (_dir, db) = test_db().await;
        let week1 = Utc.with_ymd_and_hms(2024, 2, 26, 0, 0, 0).unwrap();
        let week2 = week1 + Duration::days(7);
        let week3 = week2 + Duration::days(7);

        for week in [week2, week1, week3] {
            ReportQueries::save(&db, &report(week, ReportPersonality::Neutral)).await.unwrap();
        }

        let reports = ReportQueries::recent(&db, 2).await.unwrap();
        let weeks: Vec<_> = reports.iter().map(|r| r.week_start).collect();
        assert_eq!(weeks, vec![week3, week2]);
    }

    #[tokio::test]
    async fn test_report_for_week_and_personality_roundtrip() {
        let (_dir, db) = test_db().await;
        let week = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let saved = report(week, ReportPersonality::Roast);
        ReportQueries::save(&db, &saved).await.unwrap();

        let loaded = ReportQueries::for_week(&db, week).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.is_shareable());

        let missing = ReportQueries::for_week(&db, week + Duration::days(7)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_resave_updates_analysis_in_place() {
        let (_dir, db) = test_db().await;
        let week = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let mut saved = report(week, ReportPersonality::Neutral);
        ReportQueries::save(&db, &saved).await.unwrap();

        saved.analysis = "rewritten".to_string();
        saved.personality = ReportPersonality::Professional;
        ReportQueries::save(&db, &saved).await.unwrap();

        let reports = ReportQueries::recent(&db, 10).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].analysis, "rewritten");
        assert_eq!(reports[0].personality, ReportPersonality::Professional);
    }

    #[tokio::test]
    async fn test_row_without_personality_reads_as_neutral() {
        let (_dir, db) = test_db().await;
        let pool = db.pool().unwrap();

        sqlx::query(
            "INSERT INTO weekly_reports (id, week_start_ms, week_end_ms, raw_stats_json, analysis, created_at_ms) VALUES (?, 0, 1, '{}', 'old', 2)",
        )
        .bind(Uuid::new_v4().to_string())
        .execute(pool)
        .await
        .unwrap();

        let reports = ReportQueries::recent(&db, 10).await.unwrap();
        assert_eq!(reports[0].personality, ReportPersonality::Neutral);
    }
}
