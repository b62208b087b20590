use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{to_millis, DbSession};
use chrono::{DateTime, Utc};
use roast_common::Session;

pub struct SessionQueries;

impl SessionQueries {
    /// Writes a session. Saving the same id again replaces the row, so a
    /// retried write cannot produce a duplicate.
    pub async fn save(db: &Database, session: &Session) -> Result<()> {
        let pool = db.pool()?;
        let row = DbSession::from(session);

        sqlx::query(
            r#"
            INSERT INTO app_sessions (id, app_id, app_name, window_title, start_ms, end_ms, is_active, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                end_ms = excluded.end_ms,
                is_active = excluded.is_active,
                window_title = excluded.window_title
            "#,
        )
        .bind(&row.id)
        .bind(&row.app_id)
        .bind(&row.app_name)
        .bind(&row.window_title)
        .bind(row.start_ms)
        .bind(row.end_ms)
        .bind(row.is_active)
        .bind(row.created_at_ms)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(db: &Database, id: &str) -> Result<Session> {
        let pool = db.pool()?;

        let row = sqlx::query_as::<_, DbSession>("SELECT * FROM app_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Session {} not found", id)))?;

        Session::try_from(row)
    }

    /// Sessions whose start lies in `[start, end]`, oldest first.
    pub async fn in_range(
        db: &Database,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let pool = db.pool()?;

        let rows = sqlx::query_as::<_, DbSession>(
            "SELECT * FROM app_sessions WHERE start_ms >= ? AND start_ms <= ? ORDER BY start_ms ASC",
        )
        .bind(to_millis(start))
        .bind(to_millis(end))
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Session::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;
    use chrono::{Duration, TimeZone};
    use roast_common::FocusedApp;

    fn closed(app: &str, start: DateTime<Utc>, secs: i64) -> Session {
        let mut session = Session::begin(FocusedApp::new(app, app), start);
        session.close(start + Duration::seconds(secs));
        session
    }

    #[tokio::test]
    async fn test_save_and_get_session() {
        let (_dir, db) = test_db().await;
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let session = closed("com.editor", start, 120);

        SessionQueries::save(&db, &session).await.unwrap();

        let loaded = SessionQueries::get_by_id(&db, &session.id.to_string()).await.unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.duration(), 120.0);
    }

    #[tokio::test]
    async fn test_resaving_same_session_does_not_duplicate() {
        let (_dir, db) = test_db().await;
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let session = closed("com.editor", start, 60);

        SessionQueries::save(&db, &session).await.unwrap();
        SessionQueries::save(&db, &session).await.unwrap();

        let all = SessionQueries::in_range(&db, start, start + Duration::hours(1)).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_ordered() {
        let (_dir, db) = test_db().await;
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

        let later = closed("com.b", base + Duration::seconds(100), 10);
        let first = closed("com.a", base, 10);
        let outside = closed("com.c", base + Duration::seconds(101), 10);
        for session in [&later, &first, &outside] {
            SessionQueries::save(&db, session).await.unwrap();
        }

        let found =
            SessionQueries::in_range(&db, base, base + Duration::seconds(100)).await.unwrap();
        let ids: Vec<_> = found.iter().map(|s| s.app_id.as_str()).collect();
        assert_eq!(ids, vec!["com.a", "com.b"]);
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let (_dir, db) = test_db().await;
        let result = SessionQueries::get_by_id(&db, "nope").await;
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }
}
