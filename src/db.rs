//! Driver surface used by the reset orchestrator.
//!
//! [`Database`] is the minimal contract a connection must offer: run a
//! metadata query returning text columns, and execute a script inside one
//! transaction. It is implemented for [`rusqlite::Connection`]; other drivers
//! can implement it to use the PostgreSQL or SQL Server adapters.

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::DatabaseError;

/// Number of SQLite VM instructions between timeout checks.
const PROGRESS_OPS: i32 = 1_000;

/// A connection the orchestrator can query and write through.
///
/// Methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait Database {
    /// Run `sql` and return every row as text columns (`None` for NULL).
    fn query_text_rows(&mut self, sql: &str) -> Result<Vec<Vec<Option<String>>>, DatabaseError>;

    /// Execute `script` in a single transaction, committing only if every
    /// statement succeeds. `timeout` bounds the execution when set.
    fn execute_in_transaction(
        &mut self,
        script: &str,
        timeout: Option<Duration>,
    ) -> Result<(), DatabaseError>;
}

impl Database for Connection {
    fn query_text_rows(&mut self, sql: &str) -> Result<Vec<Vec<Option<String>>>, DatabaseError> {
        let mut stmt = self.prepare(sql)?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn execute_in_transaction(
        &mut self,
        script: &str,
        timeout: Option<Duration>,
    ) -> Result<(), DatabaseError> {
        if let Some(timeout) = timeout {
            let deadline = Instant::now() + timeout;
            self.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline))?;
        }

        let result = run_batch(self, script);

        // A stale deadline would interrupt the caller's later statements.
        if timeout.is_some() {
            self.progress_handler(PROGRESS_OPS, None::<fn() -> bool>)?;
        }
        Ok(result?)
    }
}

/// The transaction rolls back on drop unless committed.
fn run_batch(conn: &mut Connection, script: &str) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(script)?;
    tx.commit()
}

/// Open an existing SQLite database with foreign keys enforced.
///
/// A missing file is an error rather than a fresh empty database, so a
/// mistyped path cannot pass for a successful reset.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    tracing::info!(path = %path.display(), "database opened");
    Ok(conn)
}
