use anyhow::Result;
use clap::{Parser, Subcommand};
use roast_common::ReportPersonality;

mod commands;

#[derive(Parser)]
#[command(name = "roast-ctl")]
#[command(about = "Roast focus tracker CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Totals for today
    Today {
        #[arg(long, help = "Print raw JSON")]
        json: bool,
    },

    /// Behavior stats for a week
    Week {
        #[arg(short, long, default_value_t = 0, help = "0 is the current week")]
        weeks_ago: u32,
        #[arg(long, help = "Print raw JSON")]
        json: bool,
    },

    Exclude {
        #[command(subcommand)]
        action: ExcludeAction,
    },

    Reports {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Delete all sessions, visits and reports. Excluded apps are kept.
    DeleteAll {
        #[arg(long, help = "Confirm deletion")]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ExcludeAction {
    List,
    Add {
        app_id: String,
        #[arg(short, long, help = "Display name, defaults to the app id")]
        name: Option<String>,
    },
    Remove {
        app_id: String,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    List {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },
    Show {
        #[arg(help = "Any date in the week, YYYY-MM-DD")]
        week: String,
    },
    Generate {
        #[arg(short, long, default_value_t = 0)]
        weeks_ago: u32,
        #[arg(short, long, default_value = "neutral")]
        personality: ReportPersonality,
    },
    Regenerate {
        week: String,
        #[arg(short, long)]
        personality: ReportPersonality,
    },
    Share {
        week: String,
        #[arg(long, help = "Copy the whole roast instead of the one-liner")]
        full: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Today { json } => commands::today::show(json).await?,
        Commands::Week { weeks_ago, json } => commands::week::show(weeks_ago, json).await?,
        Commands::Exclude { action } => match action {
            ExcludeAction::List => commands::exclude::list().await?,
            ExcludeAction::Add { app_id, name } => {
                commands::exclude::add(&app_id, name.as_deref()).await?
            }
            ExcludeAction::Remove { app_id } => commands::exclude::remove(&app_id).await?,
        },
        Commands::Reports { action } => match action {
            ReportAction::List { limit } => commands::report::list(limit).await?,
            ReportAction::Show { week } => commands::report::show(&week).await?,
            ReportAction::Generate { weeks_ago, personality } => {
                commands::report::generate(weeks_ago, personality).await?
            }
            ReportAction::Regenerate { week, personality } => {
                commands::report::regenerate(&week, personality).await?
            }
            ReportAction::Share { week, full } => commands::report::share(&week, full).await?,
        },
        Commands::DeleteAll { yes } => commands::data::delete_all(yes).await?,
    }

    Ok(())
}
