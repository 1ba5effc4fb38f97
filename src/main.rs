use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use finance_sync::{
    config::{self, database},
    core::{
        report,
        store::LocalStore,
        sync::{JobOutcome, RetryPolicy, SyncOrchestrator},
    },
    errors::{Error, Result},
    remote::{FirestoreRemoteStore, RemoteStore},
};
use std::{env, fmt::Debug, path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "finance-sync", version, about = "Local-first sync for the finance tracker")]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy the user's remote data into an empty local store
    Pull {
        #[arg(long)]
        user: String,
    },
    /// Send unsynced local records to the remote store
    Push {
        #[arg(long)]
        user: String,
    },
    /// Pull when the device has no profile, then push
    Startup {
        #[arg(long)]
        user: String,
    },
    /// Re-run jobs left pending by an earlier process
    Resume {
        #[arg(long)]
        user: String,
    },
    /// Print the month's budget reports from local data
    Summary {
        #[arg(long)]
        user: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
}

fn log_outcome<R: Debug>(job: &str, outcome: &JobOutcome<R>) {
    match outcome {
        JobOutcome::Succeeded(report) => info!("{} succeeded: {:?}", job, report),
        JobOutcome::Retry { reason } => warn!("{} failed, retry later: {}", job, reason),
        JobOutcome::Terminal { reason } => {
            error!("{} failed and cannot be retried: {}", job, reason);
        }
    }
}

async fn print_summary(store: &LocalStore, user: &str, year: i32, month: u32) -> Result<()> {
    let summary = report::monthly_summary(store, user, year, month).await?;
    println!("{}", report::month_label(summary.month_start));
    println!(
        "  income {:.2} | expenses {:.2} | savings {:.2} | net {:.2}",
        summary.income_total, summary.expense_total, summary.savings_total, summary.net
    );
    if let (Some(amount), Some(remaining)) = (summary.budget_amount, summary.budget_remaining) {
        println!("  budget {amount:.2}, remaining {remaining:.2}");
    }

    for progress in report::category_progress(store, user, year, month).await? {
        println!(
            "  {:<20} {:>8.2} / {:<8.2} {}",
            progress.category.name,
            progress.spent,
            progress.limit,
            report::format_progress_bar(progress.percent_used, None)
        );
    }
    for goal in report::saving_goal_progress(store, user).await? {
        println!(
            "  goal {:<15} {:>8.2} / {:<8.2} {}",
            goal.goal.title,
            goal.saved,
            goal.goal.target_amount,
            report::format_progress_bar(goal.percent_complete, None)
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load the application configuration
    let app_config = config::load_config_or_default(&cli.config)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Open the local store
    let database_url = database::get_database_url(app_config.database_url.as_deref());
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let store = LocalStore::new(db);

    if let Command::Summary { user, year, month } = &cli.command {
        return print_summary(&store, user, *year, *month).await;
    }

    // 5. Connect to the remote store
    // SYNC_ID_TOKEN is read here, directly before use, not stored in AppConfig
    let token = env::var("SYNC_ID_TOKEN")
        .inspect_err(|e| error!("SYNC_ID_TOKEN not found: {}", e))
        .map_err(|e| Error::Config {
            message: format!("SYNC_ID_TOKEN: {e}"),
        })?;
    let remote: Arc<dyn RemoteStore> =
        Arc::new(FirestoreRemoteStore::new(&app_config.remote, &token)?);
    let sync = SyncOrchestrator::new(store, remote, RetryPolicy::from(&app_config.retry));

    // 6. Run the requested job
    match cli.command {
        Command::Pull { user } => log_outcome("Pull", &sync.pull(&user).await?),
        Command::Push { user } => log_outcome("Push", &sync.push(&user).await?),
        Command::Startup { user } => {
            let run = sync.startup_sync(&user).await?;
            run.pull.iter().for_each(|o| log_outcome("Pull", o));
            run.push.iter().for_each(|o| log_outcome("Push", o));
        }
        Command::Resume { user } => {
            let run = sync.resume_pending(&user).await?;
            if run.pull.is_none() && run.push.is_none() {
                info!("No pending sync jobs for {}", user);
            }
            run.pull.iter().for_each(|o| log_outcome("Pull", o));
            run.push.iter().for_each(|o| log_outcome("Push", o));
        }
        Command::Summary { .. } => {}
    }

    Ok(())
}
