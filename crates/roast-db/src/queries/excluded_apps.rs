use crate::connection::Database;
use crate::error::Result;
use crate::models::{to_millis, DbExcludedApp};
use roast_common::ExcludedApp;

pub struct ExcludedAppQueries;

impl ExcludedAppQueries {
    pub async fn add(db: &Database, app: &ExcludedApp) -> Result<()> {
        let pool = db.pool()?;

        sqlx::query(
            r#"
            INSERT INTO excluded_apps (app_id, app_name, excluded_at_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(app_id) DO UPDATE SET app_name = excluded.app_name
            "#,
        )
        .bind(&app.app_id)
        .bind(&app.app_name)
        .bind(to_millis(app.excluded_at))
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Returns whether a row was removed.
    pub async fn remove(db: &Database, app_id: &str) -> Result<bool> {
        let pool = db.pool()?;

        let result =
            sqlx::query("DELETE FROM excluded_apps WHERE app_id = ?").bind(app_id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_excluded(db: &Database, app_id: &str) -> Result<bool> {
        let pool = db.pool()?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM excluded_apps WHERE app_id = ?")
            .bind(app_id)
            .fetch_one(pool)
            .await?;

        Ok(count > 0)
    }

    pub async fn list(db: &Database) -> Result<Vec<ExcludedApp>> {
        let pool = db.pool()?;

        let rows = sqlx::query_as::<_, DbExcludedApp>(
            "SELECT * FROM excluded_apps ORDER BY app_name COLLATE NOCASE ASC",
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(ExcludedApp::try_from).collect()
    }
}
