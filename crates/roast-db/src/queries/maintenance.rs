use crate::connection::Database;
use crate::error::Result;
use tracing::info;

pub struct MaintenanceQueries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletedCounts {
    pub sessions: u64,
    pub visits: u64,
    pub reports: u64,
}

impl MaintenanceQueries {
    /// Removes every session, visit and report in one transaction. The
    /// exclusion list is a user preference and is left alone.
    pub async fn delete_all_data(db: &Database) -> Result<DeletedCounts> {
        let pool = db.pool()?;
        let mut tx = pool.begin().await?;

        let sessions = sqlx::query("DELETE FROM app_sessions").execute(&mut *tx).await?.rows_affected();
        let visits = sqlx::query("DELETE FROM app_visits").execute(&mut *tx).await?.rows_affected();
        let reports = sqlx::query("DELETE FROM weekly_reports").execute(&mut *tx).await?.rows_affected();

        tx.commit().await?;

        info!("Deleted {} sessions, {} visits and {} reports", sessions, visits, reports);

        Ok(DeletedCounts { sessions, visits, reports })
    }
}
