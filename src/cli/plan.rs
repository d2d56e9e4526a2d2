//! CLI `plan` command - show the deletion order and script without running it.

use anyhow::{Context, Result};

use tabula::config::TabulaConfig;
use tabula::reset::Resetter;

/// Compile the reset script for the configured database and print it.
pub fn plan(config: &TabulaConfig, json: bool) -> Result<()> {
    super::ensure_sqlite(config)?;
    let db_path = config.resolved_db_path();
    let mut conn = tabula::db::open_database(&db_path)?;

    let resetter = Resetter::new(config.reset.clone());
    let script = resetter
        .compile(&mut conn)
        .context("failed to compile reset script")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*script)?);
        return Ok(());
    }

    println!("Deletion plan for {}", db_path.display());
    println!("{}", "=".repeat(40));
    if script.plan.is_empty() {
        println!("  (no tables)");
    }
    for (i, layer) in script.plan.layers.iter().enumerate() {
        let names: Vec<String> = layer.iter().map(ToString::to_string).collect();
        println!("  Layer {:<3} {}", i + 1, names.join(", "));
    }

    if !script.plan.foreign_keys_to_disable.is_empty() {
        println!();
        println!("Constraints disabled (circular references):");
        for fk in &script.plan.foreign_keys_to_disable {
            println!("  {} on {}", fk.name, fk.table);
        }
    }

    println!();
    println!("Script:");
    for line in script.sql.lines() {
        println!("  {line}");
    }

    Ok(())
}
