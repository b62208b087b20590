use crate::connection::Database;
use crate::error::Result;
use crate::models::{to_millis, DbVisit};
use chrono::{DateTime, Utc};
use roast_common::Visit;

pub struct VisitQueries;

impl VisitQueries {
    pub async fn save(db: &Database, visit: &Visit) -> Result<()> {
        let pool = db.pool()?;
        let row = DbVisit::from(visit);

        sqlx::query(
            r#"
            INSERT INTO app_visits (id, app_id, app_name, timestamp_ms, duration_seconds, previous_app_id, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&row.id)
        .bind(&row.app_id)
        .bind(&row.app_name)
        .bind(row.timestamp_ms)
        .bind(row.duration_seconds)
        .bind(&row.previous_app_id)
        .bind(row.created_at_ms)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Visits whose timestamp lies in `[start, end]`, oldest first.
    pub async fn in_range(
        db: &Database,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Visit>> {
        let pool = db.pool()?;

        let rows = sqlx::query_as::<_, DbVisit>(
            "SELECT * FROM app_visits WHERE timestamp_ms >= ? AND timestamp_ms <= ? ORDER BY timestamp_ms ASC",
        )
        .bind(to_millis(start))
        .bind(to_millis(end))
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Visit::try_from).collect()
    }

    pub async fn count(db: &Database) -> Result<i64> {
        let pool = db.pool()?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_visits").fetch_one(pool).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;
    use chrono::{Duration, TimeZone};
    use roast_common::{FocusedApp, Session};

    fn visit(app: &str, start: DateTime<Utc>, secs: i64, previous: Option<&str>) -> Visit {
        let mut session = Session::begin(FocusedApp::new(app, app), start);
        session.close(start + Duration::seconds(secs));
        Visit::from_session(&session, previous.map(str::to_string))
    }

    #[tokio::test]
    async fn test_save_and_query_visits() {
        let (_dir, db) = test_db().await;
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

        let first = visit("com.editor", base, 40, None);
        let second = visit("com.chat", base + Duration::seconds(40), 5, Some("com.editor"));
        VisitQueries::save(&db, &second).await.unwrap();
        VisitQueries::save(&db, &first).await.unwrap();

        let found = VisitQueries::in_range(&db, base, base + Duration::hours(1)).await.unwrap();
        assert_eq!(found, vec![first, second]);
    }

    #[tokio::test]
    async fn test_duplicate_visit_write_is_ignored() {
        let (_dir, db) = test_db().await;
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let v = visit("com.chat", base, 5, None);

        VisitQueries::save(&db, &v).await.unwrap();
        VisitQueries::save(&db, &v).await.unwrap();

        assert_eq!(VisitQueries::count(&db).await.unwrap(), 1);
    }
}
