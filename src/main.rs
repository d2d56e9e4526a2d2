mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tabula::config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabula", version, about = "Empty a database between test runs, keeping its schema")]
struct Cli {
    /// SQLite database to operate on (overrides config and TABULA_DB)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the deletion order and the script a reset would run
    Plan {
        /// Emit the plan and script as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every row from every non-ignored table
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::TabulaConfig::load()?;
    if let Some(db) = cli.db {
        config.storage.db_path = db;
    }

    // Log to stderr so stdout stays clean for `plan --json`.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Plan { json } => cli::plan::plan(&config, json)?,
        Command::Reset { yes } => cli::reset::reset(&config, yes).await?,
    }

    Ok(())
}
