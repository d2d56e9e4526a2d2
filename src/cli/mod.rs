pub mod plan;
pub mod reset;

use anyhow::{bail, Result};
use tabula::adapter::AdapterKind;
use tabula::config::TabulaConfig;

/// The CLI opens SQLite files only; other adapters need a driver from the caller.
fn ensure_sqlite(config: &TabulaConfig) -> Result<()> {
    if config.reset.adapter != AdapterKind::Sqlite {
        bail!(
            "adapter `{}` is not supported by the CLI; only `sqlite` databases can be opened",
            config.reset.adapter
        );
    }
    Ok(())
}
