use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;
mod remote;

use commands::{CalendarCommand, ConfigCommand, DayCommand};
use config::{Config, StoreKind};
use db::{init_db, DailyLogRepository};
use moodmeal_core::{DailyLogStore, RetryingStore};
use remote::RemoteStore;

#[derive(Parser)]
#[command(name = "moodmeal")]
#[command(version)]
#[command(about = "Track daily meals and water on a monthly calendar", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// User id to read and write logs for
    #[arg(long, short, global = true)]
    user: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month of daily logs
    Calendar(CalendarCommand),

    /// View or edit one day
    Day(DayCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "moodmeal=debug,moodmeal_core=debug"
    } else {
        "moodmeal=warn,moodmeal_core=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Opens the configured store, wrapped with the configured retry policy.
async fn open_store(config: &Config) -> Result<Box<dyn DailyLogStore>, Box<dyn std::error::Error>> {
    let policy = config.retry.policy();
    let store: Box<dyn DailyLogStore> = match config.store.value {
        StoreKind::Local => {
            let pool = init_db(&config.database_path.value).await?;
            Box::new(RetryingStore::new(DailyLogRepository::new(pool), policy))
        }
        StoreKind::Remote => {
            let client = RemoteStore::from_config(&config.remote)?;
            tracing::debug!(url = client.base_url(), "Using remote store");
            Box::new(RetryingStore::new(client, policy))
        }
    };
    Ok(store)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load(cli.config)?.with_user_override(cli.user);

    match cli.command {
        Some(Commands::Calendar(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(store.as_ref(), &config).await?;
        }
        Some(Commands::Day(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(store.as_ref(), &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
