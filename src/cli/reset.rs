//! CLI `reset` command - empty every non-ignored table after user confirmation.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};

use tabula::config::TabulaConfig;
use tabula::reset::Resetter;

/// Empty the configured database, asking for confirmation unless `yes`.
pub async fn reset(config: &TabulaConfig, yes: bool) -> Result<()> {
    super::ensure_sqlite(config)?;
    let db_path = config.resolved_db_path();

    if !yes {
        println!("WARNING: This will permanently delete ALL rows from every non-ignored table.");
        println!("Database: {}", db_path.display());
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != "YES" {
            bail!("reset cancelled");
        }
    }

    let conn = tabula::db::open_database(&db_path)?;
    let db = Arc::new(Mutex::new(conn));
    let resetter = Arc::new(Resetter::new(config.reset.clone()));

    Arc::clone(&resetter)
        .reset_shared(db)
        .await
        .context("reset failed")?;

    let tables = resetter
        .compiled()
        .map(|script| script.plan.table_count())
        .unwrap_or(0);
    println!("Emptied {tables} tables. Database reset complete.");
    Ok(())
}
