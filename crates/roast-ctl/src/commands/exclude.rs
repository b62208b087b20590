use anyhow::Result;
use roast_daemon::ExclusionList;

use super::Env;

pub async fn list() -> Result<()> {
    let env = Env::open().await?;
    let exclusions = ExclusionList::empty(env.database.clone());

    let apps = exclusions.list().await?;
    if apps.is_empty() {
        println!("No excluded apps");
    } else {
        println!("Excluded apps:");
        for app in apps {
            let since = app.excluded_at.format("%Y-%m-%d");
            println!("  {} ({}) since {}", app.app_name, app.app_id, since);
        }
    }

    env.close().await;
    Ok(())
}

pub async fn add(app_id: &str, name: Option<&str>) -> Result<()> {
    let env = Env::open().await?;
    let exclusions = ExclusionList::empty(env.database.clone());

    exclusions.add(app_id, name.unwrap_or(app_id)).await?;
    println!("{} will no longer be tracked", app_id);
    println!("Restart the daemon to apply the change");

    env.close().await;
    Ok(())
}

pub async fn remove(app_id: &str) -> Result<()> {
    let env = Env::open().await?;
    let exclusions = ExclusionList::empty(env.database.clone());

    if exclusions.remove(app_id).await? {
        println!("{} will be tracked again", app_id);
    } else {
        println!("{} was not excluded", app_id);
    }

    env.close().await;
    Ok(())
}
