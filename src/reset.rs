//! Reset orchestration.
//!
//! A [`Resetter`] is configured once and reused across test runs. The first
//! reset discovers the schema through the adapter, plans the deletion order,
//! and caches the resulting script; later resets only execute the cached
//! script in a transaction.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::Serialize;

use crate::adapter::{create_adapter, DbAdapter};
use crate::config::ResetOptions;
use crate::db::Database;
use crate::error::ResetError;
use crate::planner::{self, DeletionPlan};
use crate::schema::{Relationship, TableName};

/// A planned deletion and the script rendered from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledScript {
    pub plan: DeletionPlan,
    pub sql: String,
}

enum ScriptState {
    Uncompiled,
    Compiled(Arc<CompiledScript>),
}

/// Empties every non-ignored table of a database, keeping its schema.
pub struct Resetter {
    options: ResetOptions,
    adapter: Box<dyn DbAdapter>,
    state: Mutex<ScriptState>,
}

impl std::fmt::Debug for Resetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resetter")
            .field("options", &self.options)
            .field("adapter", &self.adapter.name())
            .field("compiled", &self.compiled().is_some())
            .finish()
    }
}

impl Resetter {
    /// Create a resetter using the adapter selected by `options.adapter`.
    pub fn new(options: ResetOptions) -> Self {
        let adapter = create_adapter(options.adapter);
        Self::with_adapter(options, adapter)
    }

    /// Create a resetter with a custom adapter. `options.adapter` is ignored.
    pub fn with_adapter(options: ResetOptions, adapter: Box<dyn DbAdapter>) -> Self {
        Self {
            options,
            adapter,
            state: Mutex::new(ScriptState::Uncompiled),
        }
    }

    pub fn options(&self) -> &ResetOptions {
        &self.options
    }

    /// The cached script, if a reset or [`compile`](Self::compile) ran.
    pub fn compiled(&self) -> Option<Arc<CompiledScript>> {
        match &*self.lock_state() {
            ScriptState::Compiled(script) => Some(Arc::clone(script)),
            ScriptState::Uncompiled => None,
        }
    }

    /// Discover the schema, plan, and cache a fresh script, replacing any
    /// previously cached one.
    pub fn compile<D: Database + ?Sized>(&self, db: &mut D) -> Result<Arc<CompiledScript>, ResetError> {
        let mut state = self.lock_state();
        let script = Arc::new(self.build_script(db)?);
        *state = ScriptState::Compiled(Arc::clone(&script));
        Ok(script)
    }

    /// Empty the database, compiling the script first if needed.
    ///
    /// Nothing is committed unless the whole script succeeds.
    pub fn reset<D: Database + ?Sized>(&self, db: &mut D) -> Result<(), ResetError> {
        let script = {
            // Held across compilation so concurrent first resets plan once.
            let mut state = self.lock_state();
            let cached = match &*state {
                ScriptState::Compiled(script) => Some(Arc::clone(script)),
                ScriptState::Uncompiled => None,
            };
            match cached {
                Some(script) => script,
                None => {
                    let script = Arc::new(self.build_script(db)?);
                    *state = ScriptState::Compiled(Arc::clone(&script));
                    script
                }
            }
        };

        db.execute_in_transaction(&script.sql, self.options.command_timeout)
            .map_err(ResetError::Execution)?;

        tracing::info!(
            adapter = self.adapter.name(),
            tables = script.plan.table_count(),
            "database reset"
        );
        Ok(())
    }

    /// Async wrapper over [`reset`](Self::reset) for a shared SQLite connection.
    pub async fn reset_shared(
        self: Arc<Self>,
        db: Arc<Mutex<Connection>>,
    ) -> Result<(), ResetError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| ResetError::Task(format!("db lock poisoned: {e}")))?;
            self.reset(&mut *conn)
        })
        .await
        .map_err(|e| ResetError::Task(e.to_string()))?
    }

    fn build_script<D: Database + ?Sized>(&self, db: &mut D) -> Result<CompiledScript, ResetError> {
        let tables = self.list_tables(db)?;
        let relationships = self.list_relationships(db)?;
        tracing::debug!(
            adapter = self.adapter.name(),
            tables = tables.len(),
            relationships = relationships.len(),
            "schema discovered"
        );

        let plan = planner::plan(&tables, &relationships, self.options.cycle_policy)?;
        let sql = self.adapter.build_delete_script(&plan);
        tracing::info!(
            layers = plan.layers.len(),
            disabled = plan.foreign_keys_to_disable.len(),
            "reset script compiled"
        );
        Ok(CompiledScript { plan, sql })
    }

    fn list_tables<D: Database + ?Sized>(&self, db: &mut D) -> Result<Vec<TableName>, ResetError> {
        let sql = self.adapter.build_table_query(&self.options);
        let rows = db.query_text_rows(&sql).map_err(ResetError::Metadata)?;

        let mut tables: Vec<TableName> = Vec::with_capacity(rows.len());
        for row in rows {
            let table = match row.as_slice() {
                [schema, Some(name)] => TableName {
                    schema: schema.clone(),
                    name: name.clone(),
                },
                _ => {
                    return Err(ResetError::MalformedMetadata(format!(
                        "expected (schema, name), got {row:?}"
                    )))
                }
            };
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        Ok(tables)
    }

    fn list_relationships<D: Database + ?Sized>(
        &self,
        db: &mut D,
    ) -> Result<Vec<Relationship>, ResetError> {
        let sql = self.adapter.build_relationship_query(&self.options);
        let rows = db.query_text_rows(&sql).map_err(ResetError::Metadata)?;

        rows.into_iter()
            .map(|row| match row.as_slice() {
                [pk_schema, Some(pk_table), fk_schema, Some(fk_table), Some(name)] => {
                    Ok(Relationship::new(
                        TableName {
                            schema: pk_schema.clone(),
                            name: pk_table.clone(),
                        },
                        TableName {
                            schema: fk_schema.clone(),
                            name: fk_table.clone(),
                        },
                        name.clone(),
                    ))
                }
                _ => Err(ResetError::MalformedMetadata(format!(
                    "expected (pk_schema, pk_table, fk_schema, fk_table, constraint), got {row:?}"
                ))),
            })
            .collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, ScriptState> {
        // The state is only ever replaced whole, so a poisoned guard is still valid.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
