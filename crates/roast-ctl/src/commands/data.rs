use anyhow::Result;
use roast_db::queries::MaintenanceQueries;

use super::Env;

pub async fn delete_all(confirmed: bool) -> Result<()> {
    if !confirmed {
        println!("This deletes every session, visit and report. Run again with --yes to confirm.");
        return Ok(());
    }

    let env = Env::open().await?;
    let deleted = MaintenanceQueries::delete_all_data(&env.database).await?;

    println!(
        "Deleted {} sessions, {} visits and {} reports",
        deleted.sessions, deleted.visits, deleted.reports
    );

    env.close().await;
    Ok(())
}
