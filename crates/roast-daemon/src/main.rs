use anyhow::Result;
use roast_daemon::{daemon, DaemonConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DaemonConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    info!("Starting Roast daemon");

    if let Err(e) = daemon::run(config).await {
        error!("Daemon error: {}", e);
        return Err(e);
    }

    info!("Roast daemon stopped");
    Ok(())
}
