//! Schema lifecycle tool: applies or reverts the migrations and the
//! statistics view.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use margin_gateway::config::GatewayConfig;
use margin_gateway::persistence::{PoolStore, PostgresStore};

#[derive(Parser, Debug)]
#[command(
    name = "margin-schema",
    about = "Manage the margin-gateway database schema",
    long_about = "Runs the reversible migrations and creates or drops pool_statistic_view"
)]
struct Cli {
    /// PostgreSQL connection string (overrides DATABASE_URL).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and create the statistics view.
    Up,
    /// Drop the statistics view and revert every migration.
    Down,
    /// Show applied and pending migrations and whether the view exists.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("loading configuration")?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let store = PostgresStore::connect(&config)
        .await
        .context("connecting to postgres")?;

    match cli.command {
        Command::Up => store.setup().await.context("applying schema")?,
        Command::Down => store.teardown().await.context("reverting schema")?,
        Command::Status => {
            let status = store.schema_status().await.context("reading schema status")?;
            println!("applied:  {:?}", status.applied);
            println!("pending:  {:?}", status.pending);
            println!(
                "view:     {}",
                if status.view_present { "present" } else { "absent" }
            );
        }
    }
    Ok(())
}
